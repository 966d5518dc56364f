//! External certificate API handlers
//!
//! Consumed by the trusted off-system caller that performs the actual mint.
//! Every route sits behind the shared-secret middleware.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::AppState;
use super::types::{
    ApiResponse, MarkFailedRequest, MarkMintedRequest, PendingQuery, TokenRequest,
    UpdateCertStatusRequest,
};
use crate::certificate::{CertStats, CertStatus, CertUpdate, MintData, PendingCert, TokenWithCert};
use crate::error::CoreError;

const DEFAULT_PENDING_LIMIT: i64 = 100;

/// GET /api/cert/pending
#[utoipa::path(
    get,
    path = "/api/cert/pending",
    responses(
        (status = 200, description = "Consumed tokens awaiting a mint, oldest first", body = [PendingCert]),
        (status = 401, description = "Missing or wrong API key")
    ),
    tag = "Certificate"
)]
pub async fn list_pending(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<ApiResponse<Vec<PendingCert>>>, CoreError> {
    let limit = query.limit.unwrap_or(DEFAULT_PENDING_LIMIT);
    let pending = state.tracker.list_pending(limit).await?;
    Ok(Json(ApiResponse::success(pending)))
}

/// POST /api/cert/update-status
#[utoipa::path(
    post,
    path = "/api/cert/update-status",
    request_body = UpdateCertStatusRequest,
    responses(
        (status = 200, description = "Status updated"),
        (status = 400, description = "Unknown status or token not consumed"),
        (status = 404, description = "Unknown token"),
        (status = 409, description = "Certificate already minted")
    ),
    tag = "Certificate"
)]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateCertStatusRequest>,
) -> Result<Json<ApiResponse<&'static str>>, CoreError> {
    let status = CertStatus::parse(&req.status)?;
    state
        .tracker
        .update_status(
            &req.token,
            CertUpdate {
                status,
                ref_id: req.ref_id,
                uri: req.uri,
                tx_ref: req.tx_ref,
                recipient: req.recipient,
                error: req.error.map(Some),
            },
        )
        .await?;
    Ok(Json(ApiResponse::success("Certificate status updated")))
}

/// POST /api/cert/mark-processing
#[utoipa::path(
    post,
    path = "/api/cert/mark-processing",
    request_body = TokenRequest,
    responses((status = 200, description = "Marked as processing")),
    tag = "Certificate"
)]
pub async fn mark_processing(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<ApiResponse<&'static str>>, CoreError> {
    state.tracker.mark_processing(&req.token).await?;
    Ok(Json(ApiResponse::success("Token marked as processing")))
}

/// POST /api/cert/mark-minted
#[utoipa::path(
    post,
    path = "/api/cert/mark-minted",
    request_body = MarkMintedRequest,
    responses(
        (status = 200, description = "Marked as minted"),
        (status = 400, description = "Missing mint data or token not consumed"),
        (status = 409, description = "Certificate already minted")
    ),
    tag = "Certificate"
)]
pub async fn mark_minted(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MarkMintedRequest>,
) -> Result<Json<ApiResponse<&'static str>>, CoreError> {
    let data = MintData {
        ref_id: req.ref_id.ok_or(CoreError::MissingField("ref_id"))?,
        uri: req.uri.ok_or(CoreError::MissingField("uri"))?,
        tx_ref: req.tx_ref.ok_or(CoreError::MissingField("tx_ref"))?,
        recipient: req.recipient.ok_or(CoreError::MissingField("recipient"))?,
    };
    state.tracker.mark_minted(&req.token, data).await?;
    Ok(Json(ApiResponse::success("Certificate marked as minted")))
}

/// POST /api/cert/mark-failed
#[utoipa::path(
    post,
    path = "/api/cert/mark-failed",
    request_body = MarkFailedRequest,
    responses((status = 200, description = "Marked as failed")),
    tag = "Certificate"
)]
pub async fn mark_failed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MarkFailedRequest>,
) -> Result<Json<ApiResponse<&'static str>>, CoreError> {
    let message = req.message.ok_or(CoreError::MissingField("message"))?;
    state.tracker.mark_failed(&req.token, &message).await?;
    Ok(Json(ApiResponse::success("Certificate marked as failed")))
}

/// POST /api/cert/retry-failed
#[utoipa::path(
    post,
    path = "/api/cert/retry-failed",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Queued for retry"),
        (status = 400, description = "Certificate is not in the failed state")
    ),
    tag = "Certificate"
)]
pub async fn retry_failed(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<ApiResponse<&'static str>>, CoreError> {
    state.tracker.retry_failed(&req.token).await?;
    Ok(Json(ApiResponse::success("Certificate mint retry queued")))
}

/// GET /api/cert/stats
#[utoipa::path(
    get,
    path = "/api/cert/stats",
    responses((status = 200, description = "Counts by certificate bucket", body = CertStats)),
    tag = "Certificate"
)]
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CertStats>>, CoreError> {
    let stats = state.tracker.stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/cert/token/{token}
#[utoipa::path(
    get,
    path = "/api/cert/token/{token}",
    responses(
        (status = 200, description = "Full record with certificate fields", body = TokenWithCert),
        (status = 404, description = "Unknown token")
    ),
    tag = "Certificate"
)]
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<TokenWithCert>>, CoreError> {
    let record = state
        .tracker
        .get_with_cert(&token)
        .await?
        .ok_or(CoreError::TokenNotFound)?;
    Ok(Json(ApiResponse::success(record)))
}
