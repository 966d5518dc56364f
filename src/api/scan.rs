//! Public scan handlers
//!
//! The consume endpoint is what a token holder's scanner hits; it needs no
//! authentication and is safe to hit twice.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::AppState;
use super::types::{ScanInfoResponse, ScanResponse};
use crate::error::CoreError;

/// GET /scan/{token}
///
/// Consumes the token. Repeated presentation is non-destructive and reports
/// `status: "already"`.
#[utoipa::path(
    get,
    path = "/scan/{token}",
    responses(
        (status = 200, description = "Consumed now (ok) or previously (already)", body = ScanResponse),
        (status = 404, description = "Unknown token")
    ),
    tag = "Scan"
)]
pub async fn consume(State(state): State<Arc<AppState>>, Path(token): Path<String>) -> Response {
    match state.redeemer.consume(&token).await {
        Ok(redemption) => {
            let status = if redemption.already_consumed {
                "already"
            } else {
                "ok"
            };
            Json(ScanResponse {
                success: true,
                status: status.to_string(),
                info: Some(redemption.info.into()),
            })
            .into_response()
        }
        Err(CoreError::TokenNotFound) => (
            StatusCode::NOT_FOUND,
            Json(ScanResponse {
                success: false,
                status: "notfound".to_string(),
                info: None,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /scan/info/{token}
///
/// Details without consuming.
#[utoipa::path(
    get,
    path = "/scan/info/{token}",
    responses(
        (status = 200, description = "Token details", body = ScanInfoResponse),
        (status = 404, description = "Unknown token")
    ),
    tag = "Scan"
)]
pub async fn info(State(state): State<Arc<AppState>>, Path(token): Path<String>) -> Response {
    match state.redeemer.info(&token).await {
        Ok(Some(details)) => Json(ScanInfoResponse {
            success: true,
            found: true,
            info: Some(details.into()),
        })
        .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ScanInfoResponse {
                success: false,
                found: false,
                info: None,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
