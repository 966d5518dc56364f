//! Single-use redemption tokens
//!
//! Issuance happens inside the allocator's transaction; redemption is an
//! atomic conditional write so the same token can never be consumed twice.

pub mod issuer;
pub mod models;
pub mod redeemer;

pub use issuer::{IssuedToken, issue};
pub use models::{TokenDetails, TokenStatus};
pub use redeemer::{Redeemer, Redemption};

use sqlx::SqlitePool;

use crate::error::CoreError;

/// Issued/consumed totals for dashboard counts
#[derive(Debug, Clone, Copy)]
pub struct TokenCounts {
    pub issued: i64,
    pub consumed: i64,
}

pub async fn counts(pool: &SqlitePool) -> Result<TokenCounts, CoreError> {
    let issued: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE status = 'issued'")
        .fetch_one(pool)
        .await?;
    let consumed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tokens WHERE status = 'consumed'")
            .fetch_one(pool)
            .await?;
    Ok(TokenCounts { issued, consumed })
}
