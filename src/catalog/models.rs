//! Data models for the goods catalog

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Goods producer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Producer {
    pub id: i64,
    pub tax_id: String,
    pub name: String,
}

/// Requesting organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Requester {
    pub id: i64,
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
}

/// Production batch
///
/// `remaining_stock` is decremented only by the allocator and increased only
/// by explicit replenishment; the store enforces it never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Batch {
    pub id: i64,
    pub batch_number: String,
    pub producer_id: i64,
    pub expiry_date: NaiveDate,
    pub remaining_stock: i64,
    pub created_at: DateTime<Utc>,
}

/// Order fulfillment state, derived from allocation totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Partial,
    Fulfilled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Partial => "partial",
            OrderStatus::Fulfilled => "fulfilled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "partial" => Some(OrderStatus::Partial),
            "fulfilled" => Some(OrderStatus::Fulfilled),
            _ => None,
        }
    }
}

/// Order for units from a requesting organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub requester_id: i64,
    pub requested_quantity: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Order with requester name and running allocation total
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderSummary {
    pub id: i64,
    pub requester_id: i64,
    pub requester_name: String,
    pub requested_quantity: i64,
    pub allocated_quantity: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Immutable allocation audit record
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Fulfillment {
    pub id: i64,
    pub order_id: i64,
    pub batch_id: i64,
    pub allocated_quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Partial,
            OrderStatus::Fulfilled,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_order_status_rejects_unknown() {
        assert_eq!(OrderStatus::from_str("cancelled"), None);
    }
}
