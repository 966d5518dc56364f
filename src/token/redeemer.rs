//! Token redemption
//!
//! Exactly-once consumption. The check-then-set is a single conditional
//! UPDATE guarded on the current status, so two concurrent redemptions of
//! the same token cannot both succeed.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use super::models::TokenDetails;
use crate::error::CoreError;
use crate::store::{Database, RetryPolicy, with_retry};

/// Result of presenting a token
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Redemption {
    /// True when the token had already been consumed before this call
    pub already_consumed: bool,
    pub info: TokenDetails,
}

/// Token redemption component
pub struct Redeemer {
    db: Arc<Database>,
    retry: RetryPolicy,
}

impl Redeemer {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            retry: RetryPolicy::default(),
        }
    }

    /// Consume a token, idempotently observable.
    ///
    /// Repeated presentation returns the stored record with
    /// `already_consumed = true` and never touches `consumed_at` again.
    pub async fn consume(&self, token: &str) -> Result<Redemption, CoreError> {
        let pool = self.db.pool();
        with_retry(&self.retry, || Self::consume_once(pool, token)).await
    }

    async fn consume_once(pool: &SqlitePool, token: &str) -> Result<Redemption, CoreError> {
        let consumed_at = Utc::now();

        // Atomic conditional write: only an issued token transitions
        let result = sqlx::query(
            "UPDATE tokens SET status = 'consumed', consumed_at = ?2
             WHERE token = ?1 AND status = 'issued'",
        )
        .bind(token)
        .bind(consumed_at)
        .execute(pool)
        .await?;
        let fresh = result.rows_affected() == 1;

        let info = Self::details(pool, token)
            .await?
            .ok_or(CoreError::TokenNotFound)?;

        if fresh {
            tracing::info!(token, "Token consumed");
        }

        Ok(Redemption {
            already_consumed: !fresh,
            info,
        })
    }

    /// Read-only projection, no mutation
    pub async fn info(&self, token: &str) -> Result<Option<TokenDetails>, CoreError> {
        Self::details(self.db.pool(), token).await
    }

    async fn details(pool: &SqlitePool, token: &str) -> Result<Option<TokenDetails>, CoreError> {
        let row = sqlx::query_as::<_, TokenDetails>(
            "SELECT t.token, t.batch_id, t.order_id, t.requester_id,
                    b.batch_number, b.expiry_date,
                    p.name AS producer_name, p.tax_id AS producer_tax_id,
                    r.name AS requester_name,
                    t.status, t.issued_at, t.consumed_at
             FROM tokens t
             JOIN batches b ON t.batch_id = b.id
             JOIN producers p ON b.producer_id = p.id
             JOIN requesters r ON t.requester_id = r.id
             WHERE t.token = ?1",
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }
}
