//! API Request/Response Types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::token::{IssuedToken, TokenDetails, TokenStatus};

/// API wrapper for standard response format
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }
    }
}

// ============================================================================
// Admin surface
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProducerRequest {
    pub tax_id: String,
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRequesterRequest {
    pub name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBatchRequest {
    pub batch_number: String,
    pub producer_id: i64,
    pub expiry_date: NaiveDate,
    pub initial_stock: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplenishRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub requester_id: i64,
    pub requested_quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FulfillRequest {
    pub batch_id: i64,
    pub quantity: i64,
}

/// Issued token as presented to callers, with its derived redemption link
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenView {
    pub id: i64,
    pub token: String,
    pub url: String,
    pub status: TokenStatus,
    pub issued_at: DateTime<Utc>,
}

impl TokenView {
    /// The redemption locator is presentation-layer concern: derived here,
    /// not by the issuer
    pub fn from_issued(token: IssuedToken, base_url: &str) -> Self {
        let url = format!("{}/scan/{}", base_url, token.token);
        Self {
            id: token.id,
            token: token.token,
            url,
            status: token.status,
            issued_at: token.issued_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FulfillResponse {
    pub fulfillment: crate::catalog::Fulfillment,
    pub order: crate::catalog::Order,
    pub tokens: Vec<TokenView>,
}

/// Dashboard counts
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub batches: i64,
    pub orders: i64,
    pub tokens_issued: i64,
    pub tokens_consumed: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Public scan surface
// ============================================================================

/// Projection shown to a token holder
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanInfo {
    pub token: String,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
    pub producer_name: String,
    pub requester_name: String,
    pub status: TokenStatus,
    pub consumed_at: Option<DateTime<Utc>>,
}

impl From<TokenDetails> for ScanInfo {
    fn from(details: TokenDetails) -> Self {
        Self {
            token: details.token,
            batch_number: details.batch_number,
            expiry_date: details.expiry_date,
            producer_name: details.producer_name,
            requester_name: details.requester_name,
            status: details.status,
            consumed_at: details.consumed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanResponse {
    pub success: bool,
    /// "ok" on first consumption, "already" on repeats, "notfound" if unknown
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ScanInfo>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScanInfoResponse {
    pub success: bool,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<ScanInfo>,
}

// ============================================================================
// External certificate API
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct PendingQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCertStatusRequest {
    pub token: String,
    pub status: String,
    pub ref_id: Option<String>,
    pub uri: Option<String>,
    pub tx_ref: Option<String>,
    pub recipient: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkMintedRequest {
    pub token: String,
    pub ref_id: Option<String>,
    pub uri: Option<String>,
    pub tx_ref: Option<String>,
    pub recipient: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkFailedRequest {
    pub token: String,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_shape() {
        let response = ApiResponse::success(7);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 7);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_envelope_error_shape() {
        let response = ApiResponse::<()>::error("nope");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "nope");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_token_view_derives_url() {
        let view = TokenView::from_issued(
            IssuedToken {
                id: 1,
                token: "abc".to_string(),
                status: TokenStatus::Issued,
                issued_at: Utc::now(),
            },
            "http://localhost:3000",
        );
        assert_eq!(view.url, "http://localhost:3000/scan/abc");
    }
}
