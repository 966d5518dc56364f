//! Repository layer for catalog records
//!
//! Unit structs with pool-taking methods; creation paths validate input
//! before touching the store.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use utoipa::ToSchema;

use super::models::{Batch, Order, OrderStatus, OrderSummary, Producer, Requester};
use crate::error::CoreError;

/// Batch joined with its producer
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct BatchWithProducer {
    pub id: i64,
    pub batch_number: String,
    pub producer_id: i64,
    pub producer_name: String,
    pub expiry_date: NaiveDate,
    pub remaining_stock: i64,
    pub created_at: DateTime<Utc>,
}

/// Fulfillment joined with batch and producer context
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct FulfillmentDetail {
    pub id: i64,
    pub order_id: i64,
    pub batch_id: i64,
    pub batch_number: String,
    pub producer_name: String,
    pub allocated_quantity: i64,
    pub created_at: DateTime<Utc>,
}

pub struct ProducerRepository;

impl ProducerRepository {
    pub async fn create(pool: &SqlitePool, tax_id: &str, name: &str) -> Result<Producer, CoreError> {
        if tax_id.trim().is_empty() {
            return Err(CoreError::MissingField("tax_id"));
        }
        if name.trim().is_empty() {
            return Err(CoreError::MissingField("name"));
        }

        let result = sqlx::query("INSERT INTO producers (tax_id, name) VALUES (?1, ?2)")
            .bind(tax_id)
            .bind(name)
            .execute(pool)
            .await?;

        Ok(Producer {
            id: result.last_insert_rowid(),
            tax_id: tax_id.to_string(),
            name: name.to_string(),
        })
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Producer>, CoreError> {
        let row = sqlx::query_as::<_, Producer>(
            "SELECT id, tax_id, name FROM producers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<Producer>, CoreError> {
        let rows = sqlx::query_as::<_, Producer>(
            "SELECT id, tax_id, name FROM producers ORDER BY id DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

pub struct RequesterRepository;

impl RequesterRepository {
    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        contact_name: &str,
        email: &str,
        phone: &str,
    ) -> Result<Requester, CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::MissingField("name"));
        }
        if contact_name.trim().is_empty() {
            return Err(CoreError::MissingField("contact_name"));
        }

        let result = sqlx::query(
            "INSERT INTO requesters (name, contact_name, email, phone) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(contact_name)
        .bind(email)
        .bind(phone)
        .execute(pool)
        .await?;

        Ok(Requester {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            contact_name: contact_name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Requester>, CoreError> {
        let row = sqlx::query_as::<_, Requester>(
            "SELECT id, name, contact_name, email, phone FROM requesters WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<Requester>, CoreError> {
        let rows = sqlx::query_as::<_, Requester>(
            "SELECT id, name, contact_name, email, phone FROM requesters ORDER BY id DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

pub struct BatchRepository;

impl BatchRepository {
    pub async fn create(
        pool: &SqlitePool,
        batch_number: &str,
        producer_id: i64,
        expiry_date: NaiveDate,
        initial_stock: i64,
    ) -> Result<Batch, CoreError> {
        if batch_number.trim().is_empty() {
            return Err(CoreError::MissingField("batch_number"));
        }
        if initial_stock < 0 {
            return Err(CoreError::InvalidQuantity);
        }

        let producer_exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM producers WHERE id = ?1")
                .bind(producer_id)
                .fetch_optional(pool)
                .await?;
        if producer_exists.is_none() {
            return Err(CoreError::ProducerNotFound(producer_id));
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO batches (batch_number, producer_id, expiry_date, remaining_stock, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(batch_number)
        .bind(producer_id)
        .bind(expiry_date)
        .bind(initial_stock)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(Batch {
            id: result.last_insert_rowid(),
            batch_number: batch_number.to_string(),
            producer_id,
            expiry_date,
            remaining_stock: initial_stock,
            created_at,
        })
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Batch>, CoreError> {
        let row = sqlx::query_as::<_, Batch>(
            "SELECT id, batch_number, producer_id, expiry_date, remaining_stock, created_at
             FROM batches WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<BatchWithProducer>, CoreError> {
        let rows = sqlx::query_as::<_, BatchWithProducer>(
            "SELECT b.id, b.batch_number, b.producer_id, p.name AS producer_name,
                    b.expiry_date, b.remaining_stock, b.created_at
             FROM batches b
             JOIN producers p ON b.producer_id = p.id
             ORDER BY b.id DESC",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Explicit stock replenishment, the only stock increase outside the allocator
    pub async fn replenish(pool: &SqlitePool, id: i64, quantity: i64) -> Result<Batch, CoreError> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity);
        }

        let result =
            sqlx::query("UPDATE batches SET remaining_stock = remaining_stock + ?1 WHERE id = ?2")
                .bind(quantity)
                .bind(id)
                .execute(pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::BatchNotFound(id));
        }

        Self::get(pool, id).await?.ok_or(CoreError::BatchNotFound(id))
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, CoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

pub struct OrderRepository;

impl OrderRepository {
    pub async fn create(
        pool: &SqlitePool,
        requester_id: i64,
        requested_quantity: i64,
    ) -> Result<Order, CoreError> {
        if requested_quantity <= 0 {
            return Err(CoreError::InvalidQuantity);
        }

        let requester_exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM requesters WHERE id = ?1")
                .bind(requester_id)
                .fetch_optional(pool)
                .await?;
        if requester_exists.is_none() {
            return Err(CoreError::RequesterNotFound(requester_id));
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO orders (requester_id, requested_quantity, status, created_at)
             VALUES (?1, ?2, 'pending', ?3)",
        )
        .bind(requester_id)
        .bind(requested_quantity)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(Order {
            id: result.last_insert_rowid(),
            requester_id,
            requested_quantity,
            status: OrderStatus::Pending,
            created_at,
        })
    }

    pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Order>, CoreError> {
        let row = sqlx::query(
            "SELECT id, requester_id, requested_quantity, status, created_at
             FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_order(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<OrderSummary>, CoreError> {
        let rows = sqlx::query(
            "SELECT o.id, o.requester_id, r.name AS requester_name, o.requested_quantity,
                    COALESCE(SUM(f.allocated_quantity), 0) AS allocated_quantity,
                    o.status, o.created_at
             FROM orders o
             JOIN requesters r ON o.requester_id = r.id
             LEFT JOIN fulfillments f ON o.id = f.order_id
             GROUP BY o.id
             ORDER BY o.id DESC",
        )
        .fetch_all(pool)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            summaries.push(OrderSummary {
                id: row.get("id"),
                requester_id: row.get("requester_id"),
                requester_name: row.get("requester_name"),
                requested_quantity: row.get("requested_quantity"),
                allocated_quantity: row.get("allocated_quantity"),
                status: parse_status(row.get("status"))?,
                created_at: row.get("created_at"),
            });
        }
        Ok(summaries)
    }

    /// Fulfillment history for an order, newest first
    pub async fn fulfillments(
        pool: &SqlitePool,
        order_id: i64,
    ) -> Result<Vec<FulfillmentDetail>, CoreError> {
        let rows = sqlx::query_as::<_, FulfillmentDetail>(
            "SELECT f.id, f.order_id, f.batch_id, b.batch_number, p.name AS producer_name,
                    f.allocated_quantity, f.created_at
             FROM fulfillments f
             JOIN batches b ON f.batch_id = b.id
             JOIN producers p ON b.producer_id = p.id
             WHERE f.order_id = ?1
             ORDER BY f.id DESC",
        )
        .bind(order_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Sum of allocated quantities for an order; runs on the caller's
    /// executor so the allocator can read it inside its open transaction
    pub async fn allocated_total(
        executor: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        order_id: i64,
    ) -> Result<i64, CoreError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(allocated_quantity), 0) FROM fulfillments WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, CoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

pub(crate) fn parse_status(s: String) -> Result<OrderStatus, CoreError> {
    OrderStatus::from_str(&s).ok_or_else(|| {
        CoreError::Store(sqlx::Error::Decode(
            format!("invalid order status: {}", s).into(),
        ))
    })
}

pub(crate) fn row_to_order(row: &SqliteRow) -> Result<Order, CoreError> {
    Ok(Order {
        id: row.get("id"),
        requester_id: row.get("requester_id"),
        requested_quantity: row.get("requested_quantity"),
        status: parse_status(row.get("status"))?,
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, migrate};

    async fn setup() -> Database {
        let db = Database::connect_in_memory().await.unwrap();
        migrate(db.pool()).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_producer_create_and_get() {
        let db = setup().await;
        let producer = ProducerRepository::create(db.pool(), "12.345.678/0001-90", "VerdeLeite")
            .await
            .unwrap();
        assert!(producer.id > 0);

        let loaded = ProducerRepository::get(db.pool(), producer.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.name, "VerdeLeite");
    }

    #[tokio::test]
    async fn test_producer_create_rejects_blank_name() {
        let db = setup().await;
        let result = ProducerRepository::create(db.pool(), "12.345.678/0001-90", "  ").await;
        assert!(matches!(result, Err(CoreError::MissingField("name"))));
    }

    #[tokio::test]
    async fn test_batch_create_requires_producer() {
        let db = setup().await;
        let expiry = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let result = BatchRepository::create(db.pool(), "B-001", 99, expiry, 100).await;
        assert!(matches!(result, Err(CoreError::ProducerNotFound(99))));
    }

    #[tokio::test]
    async fn test_batch_replenish() {
        let db = setup().await;
        let producer = ProducerRepository::create(db.pool(), "11.111.111/0001-11", "Acme")
            .await
            .unwrap();
        let expiry = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let batch = BatchRepository::create(db.pool(), "B-001", producer.id, expiry, 50)
            .await
            .unwrap();

        let updated = BatchRepository::replenish(db.pool(), batch.id, 25).await.unwrap();
        assert_eq!(updated.remaining_stock, 75);

        let result = BatchRepository::replenish(db.pool(), batch.id, 0).await;
        assert!(matches!(result, Err(CoreError::InvalidQuantity)));
    }

    #[tokio::test]
    async fn test_order_create_starts_pending() {
        let db = setup().await;
        let requester = RequesterRepository::create(
            db.pool(),
            "Bairro Central",
            "Maria Silva",
            "central@example.com",
            "+55 11 99999-0000",
        )
        .await
        .unwrap();

        let order = OrderRepository::create(db.pool(), requester.id, 40).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.requested_quantity, 40);

        let summaries = OrderRepository::list(db.pool()).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].allocated_quantity, 0);
    }

    #[tokio::test]
    async fn test_order_create_rejects_zero_quantity() {
        let db = setup().await;
        let result = OrderRepository::create(db.pool(), 1, 0).await;
        assert!(matches!(result, Err(CoreError::InvalidQuantity)));
    }
}
