//! Core Error Types
//!
//! Closed error taxonomy for the allocation engine, token lifecycle and
//! certificate tracker. Matched exhaustively at the transport boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Core error types
///
/// Error codes are stable strings used in API responses and tests.
#[derive(Error, Debug)]
pub enum CoreError {
    // === Validation Errors ===
    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Batch {batch_id} only has {available} units available")]
    InsufficientStock { batch_id: i64, available: i64 },

    #[error(
        "Cannot allocate {quantity} units: order requested {requested}, already allocated {allocated}"
    )]
    OverAllocation {
        quantity: i64,
        requested: i64,
        allocated: i64,
    },

    #[error("Unknown certificate status: {0}")]
    UnknownCertStatus(String),

    #[error("Token must be consumed before the certificate can be minted")]
    TokenNotConsumed,

    #[error("Can only retry a failed certificate")]
    RetryNotFailed,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    // === Not Found Errors ===
    #[error("Order {0} not found")]
    OrderNotFound(i64),

    #[error("Batch {0} not found")]
    BatchNotFound(i64),

    #[error("Producer {0} not found")]
    ProducerNotFound(i64),

    #[error("Requester {0} not found")]
    RequesterNotFound(i64),

    #[error("Token not found")]
    TokenNotFound,

    // === Auth Errors ===
    #[error("Invalid API credential")]
    Unauthorized,

    // === Conflict Errors ===
    #[error("Certificate already minted for this token")]
    CertAlreadyMinted,

    // === System Errors ===
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl CoreError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::InvalidQuantity => "INVALID_QUANTITY",
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::OverAllocation { .. } => "OVER_ALLOCATION",
            CoreError::UnknownCertStatus(_) => "UNKNOWN_CERT_STATUS",
            CoreError::TokenNotConsumed => "TOKEN_NOT_CONSUMED",
            CoreError::RetryNotFailed => "RETRY_NOT_FAILED",
            CoreError::MissingField(_) => "MISSING_FIELD",
            CoreError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            CoreError::BatchNotFound(_) => "BATCH_NOT_FOUND",
            CoreError::ProducerNotFound(_) => "PRODUCER_NOT_FOUND",
            CoreError::RequesterNotFound(_) => "REQUESTER_NOT_FOUND",
            CoreError::TokenNotFound => "TOKEN_NOT_FOUND",
            CoreError::Unauthorized => "UNAUTHORIZED",
            CoreError::CertAlreadyMinted => "CERT_ALREADY_MINTED",
            CoreError::Store(_) => "STORE_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn http_status(&self) -> StatusCode {
        match self {
            CoreError::InvalidQuantity
            | CoreError::InsufficientStock { .. }
            | CoreError::OverAllocation { .. }
            | CoreError::UnknownCertStatus(_)
            | CoreError::TokenNotConsumed
            | CoreError::RetryNotFailed
            | CoreError::MissingField(_) => StatusCode::BAD_REQUEST,
            CoreError::OrderNotFound(_)
            | CoreError::BatchNotFound(_)
            | CoreError::ProducerNotFound(_)
            | CoreError::RequesterNotFound(_)
            | CoreError::TokenNotFound => StatusCode::NOT_FOUND,
            CoreError::Unauthorized => StatusCode::UNAUTHORIZED,
            CoreError::CertAlreadyMinted => StatusCode::CONFLICT,
            CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON response body for errors
#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        // Store errors are logged with their cause; the response body stays generic
        let message = if let CoreError::Store(ref e) = self {
            tracing::error!("Store error: {:?}", e);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            success: false,
            error: message,
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}
