//! Token data models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Redemption status, one-way issued → consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TokenStatus {
    Issued,
    Consumed,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Issued => "issued",
            TokenStatus::Consumed => "consumed",
        }
    }
}

/// Token projection with batch, producer and requester context
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct TokenDetails {
    pub token: String,
    pub batch_id: i64,
    pub order_id: Option<i64>,
    pub requester_id: i64,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub producer_name: String,
    pub producer_tax_id: String,
    pub requester_name: String,
    pub status: TokenStatus,
    pub issued_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_as_str() {
        assert_eq!(TokenStatus::Issued.as_str(), "issued");
        assert_eq!(TokenStatus::Consumed.as_str(), "consumed");
    }
}
