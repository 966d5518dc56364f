//! Token issuance
//!
//! Runs on the caller's open transaction connection; a failed allocation
//! therefore never leaves tokens behind.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use utoipa::ToSchema;
use uuid::Uuid;

use super::models::TokenStatus;
use crate::error::CoreError;

/// A freshly minted token
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    pub id: i64,
    pub token: String,
    pub status: TokenStatus,
    pub issued_at: DateTime<Utc>,
}

/// Mint `count` tokens bound to one allocation.
///
/// Identifiers are UUIDv4 (122 random bits). Inserted sequentially on the
/// caller's connection so they commit or roll back with the allocation.
pub async fn issue(
    conn: &mut SqliteConnection,
    batch_id: i64,
    order_id: i64,
    requester_id: i64,
    count: i64,
    issued_at: DateTime<Utc>,
) -> Result<Vec<IssuedToken>, CoreError> {
    if count <= 0 {
        return Err(CoreError::InvalidQuantity);
    }

    let mut tokens = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let token = Uuid::new_v4().to_string();

        let result = sqlx::query(
            "INSERT INTO tokens (token, batch_id, order_id, requester_id, status, issued_at)
             VALUES (?1, ?2, ?3, ?4, 'issued', ?5)",
        )
        .bind(&token)
        .bind(batch_id)
        .bind(order_id)
        .bind(requester_id)
        .bind(issued_at)
        .execute(&mut *conn)
        .await?;

        tokens.push(IssuedToken {
            id: result.last_insert_rowid(),
            token,
            status: TokenStatus::Issued,
            issued_at,
        });
    }

    Ok(tokens)
}
