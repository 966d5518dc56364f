//! Inventory allocation engine
//!
//! `fulfill` assigns batch stock to an order, records the immutable
//! fulfillment, recomputes the derived order status and mints one token per
//! allocated unit, all inside a single transaction. Any failure rolls the
//! whole unit back: no partial stock decrement, no orphaned fulfillment, no
//! tokens without a backing allocation.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::catalog::models::{Batch, Fulfillment, Order, OrderStatus};
use crate::catalog::repository::{OrderRepository, row_to_order};
use crate::error::CoreError;
use crate::store::{Database, RetryPolicy, with_retry};
use crate::token::{IssuedToken, issue};

/// Everything produced by one successful fulfillment
#[derive(Debug, Serialize, ToSchema)]
pub struct FulfillOutcome {
    pub fulfillment: Fulfillment,
    pub order: Order,
    pub tokens: Vec<IssuedToken>,
}

/// Order-fulfillment allocation component
pub struct Allocator {
    db: Arc<Database>,
    retry: RetryPolicy,
}

impl Allocator {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            retry: RetryPolicy::default(),
        }
    }

    /// Allocate `quantity` units of a batch to an order.
    ///
    /// Not idempotent on identical arguments: a caller that times out and
    /// retries performs a second allocation.
    pub async fn fulfill(
        &self,
        order_id: i64,
        batch_id: i64,
        quantity: i64,
    ) -> Result<FulfillOutcome, CoreError> {
        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity);
        }

        let pool = self.db.pool();
        // The whole transaction re-runs on contention, re-validating from scratch
        with_retry(&self.retry, || {
            Self::fulfill_tx(pool, order_id, batch_id, quantity)
        })
        .await
    }

    async fn fulfill_tx(
        pool: &SqlitePool,
        order_id: i64,
        batch_id: i64,
        quantity: i64,
    ) -> Result<FulfillOutcome, CoreError> {
        // Scoped transaction guard: drop on any early return rolls back
        let mut tx = pool.begin().await?;

        let order = match sqlx::query(
            "SELECT id, requester_id, requested_quantity, status, created_at
             FROM orders WHERE id = ?1",
        )
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        {
            Some(row) => row_to_order(&row)?,
            None => return Err(CoreError::OrderNotFound(order_id)),
        };

        let batch = sqlx::query_as::<_, Batch>(
            "SELECT id, batch_number, producer_id, expiry_date, remaining_stock, created_at
             FROM batches WHERE id = ?1",
        )
        .bind(batch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CoreError::BatchNotFound(batch_id))?;

        if batch.remaining_stock < quantity {
            return Err(CoreError::InsufficientStock {
                batch_id,
                available: batch.remaining_stock,
            });
        }

        let prior_allocated = OrderRepository::allocated_total(&mut *tx, order_id).await?;
        let new_total = prior_allocated + quantity;
        if new_total > order.requested_quantity {
            return Err(CoreError::OverAllocation {
                quantity,
                requested: order.requested_quantity,
                allocated: prior_allocated,
            });
        }

        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO fulfillments (order_id, batch_id, allocated_quantity, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order_id)
        .bind(batch_id)
        .bind(quantity)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;
        let fulfillment = Fulfillment {
            id: result.last_insert_rowid(),
            order_id,
            batch_id,
            allocated_quantity: quantity,
            created_at,
        };

        sqlx::query("UPDATE batches SET remaining_stock = remaining_stock - ?1 WHERE id = ?2")
            .bind(quantity)
            .bind(batch_id)
            .execute(&mut *tx)
            .await?;

        let new_status = if new_total >= order.requested_quantity {
            OrderStatus::Fulfilled
        } else {
            OrderStatus::Partial
        };
        sqlx::query("UPDATE orders SET status = ?1 WHERE id = ?2")
            .bind(new_status.as_str())
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        // Same transaction: one token per allocated unit
        let tokens = issue(
            &mut tx,
            batch_id,
            order_id,
            order.requester_id,
            quantity,
            created_at,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            order_id,
            batch_id,
            quantity,
            status = new_status.as_str(),
            "Order fulfillment allocated"
        );

        Ok(FulfillOutcome {
            fulfillment,
            order: Order {
                status: new_status,
                ..order
            },
            tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::migrate;

    async fn setup() -> Arc<Database> {
        let db = Arc::new(Database::connect_in_memory().await.unwrap());
        migrate(db.pool()).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_fulfill_rejects_non_positive_quantity() {
        let db = setup().await;
        let allocator = Allocator::new(db);
        let result = allocator.fulfill(1, 1, 0).await;
        assert!(matches!(result, Err(CoreError::InvalidQuantity)));
        let result = allocator.fulfill(1, 1, -3).await;
        assert!(matches!(result, Err(CoreError::InvalidQuantity)));
    }

    #[tokio::test]
    async fn test_fulfill_missing_order() {
        let db = setup().await;
        let allocator = Allocator::new(db);
        let result = allocator.fulfill(42, 1, 5).await;
        assert!(matches!(result, Err(CoreError::OrderNotFound(42))));
    }

    #[tokio::test]
    async fn test_fulfill_missing_batch() {
        let db = setup().await;
        sqlx::query("INSERT INTO requesters (name, contact_name, email, phone) VALUES ('R', 'C', 'e', 'p')")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO orders (requester_id, requested_quantity, status, created_at)
             VALUES (1, 40, 'pending', '2026-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let allocator = Allocator::new(db);
        let result = allocator.fulfill(1, 9, 5).await;
        assert!(matches!(result, Err(CoreError::BatchNotFound(9))));
    }
}
