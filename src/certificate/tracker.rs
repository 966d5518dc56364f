//! Certificate status tracker
//!
//! State transitions are validated against the persisted row inside a
//! transaction; field updates are applied only for fields the caller
//! explicitly supplied.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use utoipa::ToSchema;

use super::status::CertStatus;
use crate::error::CoreError;
use crate::store::{Database, RetryPolicy, with_retry};
use crate::token::TokenStatus;

/// One status transition, with the fields it carries.
///
/// `None` means "leave the column untouched"; for the error message,
/// `Some(None)` explicitly clears it.
#[derive(Debug, Clone)]
pub struct CertUpdate {
    pub status: CertStatus,
    pub ref_id: Option<String>,
    pub uri: Option<String>,
    pub tx_ref: Option<String>,
    pub recipient: Option<String>,
    pub error: Option<Option<String>>,
}

impl CertUpdate {
    pub fn new(status: CertStatus) -> Self {
        Self {
            status,
            ref_id: None,
            uri: None,
            tx_ref: None,
            recipient: None,
            error: None,
        }
    }
}

/// Data reported by the external caller on a successful mint
#[derive(Debug, Clone)]
pub struct MintData {
    pub ref_id: String,
    pub uri: String,
    pub tx_ref: String,
    pub recipient: String,
}

/// Consumed-but-unresolved token, with full context for the external caller
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct PendingCert {
    pub token: String,
    pub consumed_at: DateTime<Utc>,
    pub cert_status: Option<CertStatus>,
    pub cert_error: Option<String>,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub producer_name: String,
    pub producer_tax_id: String,
    pub requester_name: String,
    pub requester_contact: String,
}

/// Full token record including certificate fields
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct TokenWithCert {
    pub token: String,
    pub batch_id: i64,
    pub order_id: Option<i64>,
    pub requester_id: i64,
    pub status: TokenStatus,
    pub issued_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub cert_status: Option<CertStatus>,
    pub cert_ref_id: Option<String>,
    pub cert_uri: Option<String>,
    pub cert_tx_ref: Option<String>,
    pub cert_recipient: Option<String>,
    pub cert_error: Option<String>,
    pub cert_minted_at: Option<DateTime<Utc>>,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub producer_name: String,
    pub requester_name: String,
}

/// Certificate counts by bucket
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CertStats {
    pub pending: i64,
    pub processing: i64,
    pub minted: i64,
    pub failed: i64,
    pub total_consumed: i64,
}

/// Certificate status tracking component
pub struct CertTracker {
    db: Arc<Database>,
    retry: RetryPolicy,
}

impl CertTracker {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            retry: RetryPolicy::default(),
        }
    }

    /// Apply one state transition.
    ///
    /// A minted record rejects every further update; minting requires the
    /// token to be consumed first. Stamps `cert_minted_at` on the
    /// transition to minted.
    pub async fn update_status(&self, token: &str, update: CertUpdate) -> Result<(), CoreError> {
        let pool = self.db.pool();
        with_retry(&self.retry, || Self::update_tx(pool, token, &update)).await
    }

    async fn update_tx(pool: &SqlitePool, token: &str, update: &CertUpdate) -> Result<(), CoreError> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query("SELECT status, cert_status FROM tokens WHERE token = ?1")
            .bind(token)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(CoreError::TokenNotFound)?;
        let redemption: TokenStatus = row.get("status");
        let current: Option<CertStatus> = row.get("cert_status");

        if current == Some(CertStatus::Minted) {
            return Err(CoreError::CertAlreadyMinted);
        }
        if update.status == CertStatus::Minted && redemption != TokenStatus::Consumed {
            return Err(CoreError::TokenNotConsumed);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE tokens SET cert_status = ");
        qb.push_bind(update.status);
        if let Some(ref v) = update.ref_id {
            qb.push(", cert_ref_id = ").push_bind(v);
        }
        if let Some(ref v) = update.uri {
            qb.push(", cert_uri = ").push_bind(v);
        }
        if let Some(ref v) = update.tx_ref {
            qb.push(", cert_tx_ref = ").push_bind(v);
        }
        if let Some(ref v) = update.recipient {
            qb.push(", cert_recipient = ").push_bind(v);
        }
        if let Some(ref v) = update.error {
            qb.push(", cert_error = ").push_bind(v.clone());
        }
        if update.status == CertStatus::Minted {
            qb.push(", cert_minted_at = ").push_bind(Utc::now());
        }
        qb.push(" WHERE token = ").push_bind(token);
        qb.build().execute(&mut *tx).await?;

        tx.commit().await?;

        tracing::info!(token, status = update.status.as_str(), "Certificate status updated");
        Ok(())
    }

    pub async fn mark_processing(&self, token: &str) -> Result<(), CoreError> {
        self.update_status(token, CertUpdate::new(CertStatus::Processing))
            .await
    }

    pub async fn mark_minted(&self, token: &str, data: MintData) -> Result<(), CoreError> {
        self.update_status(
            token,
            CertUpdate {
                status: CertStatus::Minted,
                ref_id: Some(data.ref_id),
                uri: Some(data.uri),
                tx_ref: Some(data.tx_ref),
                recipient: Some(data.recipient),
                error: None,
            },
        )
        .await
    }

    pub async fn mark_failed(&self, token: &str, message: &str) -> Result<(), CoreError> {
        self.update_status(
            token,
            CertUpdate {
                status: CertStatus::Failed,
                ref_id: None,
                uri: None,
                tx_ref: None,
                recipient: None,
                error: Some(Some(message.to_string())),
            },
        )
        .await
    }

    /// Put a failed certificate back in the queue, clearing its error
    pub async fn retry_failed(&self, token: &str) -> Result<(), CoreError> {
        let pool = self.db.pool();
        with_retry(&self.retry, || Self::retry_tx(pool, token)).await
    }

    async fn retry_tx(pool: &SqlitePool, token: &str) -> Result<(), CoreError> {
        let mut tx = pool.begin().await?;

        let current: Option<Option<CertStatus>> =
            sqlx::query_scalar("SELECT cert_status FROM tokens WHERE token = ?1")
                .bind(token)
                .fetch_optional(&mut *tx)
                .await?;
        let current = current.ok_or(CoreError::TokenNotFound)?;

        if current != Some(CertStatus::Failed) {
            return Err(CoreError::RetryNotFailed);
        }

        sqlx::query("UPDATE tokens SET cert_status = 'pending', cert_error = NULL WHERE token = ?1")
            .bind(token)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(token, "Certificate mint queued for retry");
        Ok(())
    }

    /// Consumed tokens still awaiting a mint, oldest consumption first
    pub async fn list_pending(&self, limit: i64) -> Result<Vec<PendingCert>, CoreError> {
        let rows = sqlx::query_as::<_, PendingCert>(
            "SELECT t.token, t.consumed_at, t.cert_status, t.cert_error,
                    b.batch_number, b.expiry_date,
                    p.name AS producer_name, p.tax_id AS producer_tax_id,
                    r.name AS requester_name, r.contact_name AS requester_contact
             FROM tokens t
             JOIN batches b ON t.batch_id = b.id
             JOIN producers p ON b.producer_id = p.id
             JOIN requesters r ON t.requester_id = r.id
             WHERE t.status = 'consumed'
               AND (t.cert_status IS NULL OR t.cert_status IN ('pending', 'failed'))
             ORDER BY t.consumed_at ASC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// Certificate counts by bucket plus total consumed
    pub async fn stats(&self) -> Result<CertStats, CoreError> {
        let pool = self.db.pool();

        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tokens
             WHERE status = 'consumed' AND (cert_status IS NULL OR cert_status = 'pending')",
        )
        .fetch_one(pool)
        .await?;
        let processing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE cert_status = 'processing'")
                .fetch_one(pool)
                .await?;
        let minted: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE cert_status = 'minted'")
                .fetch_one(pool)
                .await?;
        let failed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE cert_status = 'failed'")
                .fetch_one(pool)
                .await?;
        let total_consumed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE status = 'consumed'")
                .fetch_one(pool)
                .await?;

        Ok(CertStats {
            pending,
            processing,
            minted,
            failed,
            total_consumed,
        })
    }

    /// Full record including certificate fields, `None` if absent
    pub async fn get_with_cert(&self, token: &str) -> Result<Option<TokenWithCert>, CoreError> {
        let row = sqlx::query_as::<_, TokenWithCert>(
            "SELECT t.token, t.batch_id, t.order_id, t.requester_id,
                    t.status, t.issued_at, t.consumed_at,
                    t.cert_status, t.cert_ref_id, t.cert_uri, t.cert_tx_ref,
                    t.cert_recipient, t.cert_error, t.cert_minted_at,
                    b.batch_number, b.expiry_date,
                    p.name AS producer_name, r.name AS requester_name
             FROM tokens t
             JOIN batches b ON t.batch_id = b.id
             JOIN producers p ON b.producer_id = p.id
             JOIN requesters r ON t.requester_id = r.id
             WHERE t.token = ?1",
        )
        .bind(token)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row)
    }
}
