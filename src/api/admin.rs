//! Administrative handlers
//!
//! Thin layer over the catalog repositories and the allocation engine.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::AppState;
use super::types::{
    ApiResponse, CreateBatchRequest, CreateOrderRequest, CreateProducerRequest,
    CreateRequesterRequest, FulfillRequest, FulfillResponse, HealthResponse, ReplenishRequest,
    StatsResponse, TokenView,
};
use crate::catalog::repository::{BatchWithProducer, FulfillmentDetail};
use crate::catalog::{
    Batch, BatchRepository, Order, OrderRepository, OrderSummary, Producer, ProducerRepository,
    Requester, RequesterRepository,
};
use crate::error::CoreError;
use crate::token;

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service and store are healthy", body = HealthResponse)),
    tag = "Admin"
)]
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, CoreError> {
    state.db.health_check().await?;
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("GIT_HASH").to_string(),
    }))
}

/// POST /api/producers
#[utoipa::path(
    post,
    path = "/api/producers",
    request_body = CreateProducerRequest,
    responses((status = 200, description = "Producer created")),
    tag = "Admin"
)]
pub async fn create_producer(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProducerRequest>,
) -> Result<Json<ApiResponse<Producer>>, CoreError> {
    let producer = ProducerRepository::create(state.db.pool(), &req.tax_id, &req.name).await?;
    Ok(Json(ApiResponse::success(producer)))
}

/// GET /api/producers
#[utoipa::path(
    get,
    path = "/api/producers",
    responses((status = 200, description = "All producers")),
    tag = "Admin"
)]
pub async fn list_producers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Producer>>>, CoreError> {
    let producers = ProducerRepository::list(state.db.pool()).await?;
    Ok(Json(ApiResponse::success(producers)))
}

/// POST /api/requesters
#[utoipa::path(
    post,
    path = "/api/requesters",
    request_body = CreateRequesterRequest,
    responses((status = 200, description = "Requester created")),
    tag = "Admin"
)]
pub async fn create_requester(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRequesterRequest>,
) -> Result<Json<ApiResponse<Requester>>, CoreError> {
    let requester = RequesterRepository::create(
        state.db.pool(),
        &req.name,
        &req.contact_name,
        &req.email,
        &req.phone,
    )
    .await?;
    Ok(Json(ApiResponse::success(requester)))
}

/// GET /api/requesters
#[utoipa::path(
    get,
    path = "/api/requesters",
    responses((status = 200, description = "All requesters")),
    tag = "Admin"
)]
pub async fn list_requesters(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Requester>>>, CoreError> {
    let requesters = RequesterRepository::list(state.db.pool()).await?;
    Ok(Json(ApiResponse::success(requesters)))
}

/// POST /api/batches
#[utoipa::path(
    post,
    path = "/api/batches",
    request_body = CreateBatchRequest,
    responses((status = 200, description = "Batch created")),
    tag = "Admin"
)]
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBatchRequest>,
) -> Result<Json<ApiResponse<Batch>>, CoreError> {
    let batch = BatchRepository::create(
        state.db.pool(),
        &req.batch_number,
        req.producer_id,
        req.expiry_date,
        req.initial_stock,
    )
    .await?;
    Ok(Json(ApiResponse::success(batch)))
}

/// GET /api/batches
#[utoipa::path(
    get,
    path = "/api/batches",
    responses((status = 200, description = "All batches with producer context")),
    tag = "Admin"
)]
pub async fn list_batches(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BatchWithProducer>>>, CoreError> {
    let batches = BatchRepository::list(state.db.pool()).await?;
    Ok(Json(ApiResponse::success(batches)))
}

/// POST /api/batches/{id}/replenish
#[utoipa::path(
    post,
    path = "/api/batches/{id}/replenish",
    request_body = ReplenishRequest,
    responses((status = 200, description = "Stock increased")),
    tag = "Admin"
)]
pub async fn replenish_batch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ReplenishRequest>,
) -> Result<Json<ApiResponse<Batch>>, CoreError> {
    let batch = BatchRepository::replenish(state.db.pool(), id, req.quantity).await?;
    Ok(Json(ApiResponse::success(batch)))
}

/// POST /api/orders
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses((status = 200, description = "Order created, status pending")),
    tag = "Admin"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<Order>>, CoreError> {
    let order =
        OrderRepository::create(state.db.pool(), req.requester_id, req.requested_quantity).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    responses((status = 200, description = "All orders with allocation totals")),
    tag = "Admin"
)]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<OrderSummary>>>, CoreError> {
    let orders = OrderRepository::list(state.db.pool()).await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    responses(
        (status = 200, description = "Order found"),
        (status = 404, description = "No such order")
    ),
    tag = "Admin"
)]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Order>>, CoreError> {
    let order = OrderRepository::get(state.db.pool(), id)
        .await?
        .ok_or(CoreError::OrderNotFound(id))?;
    Ok(Json(ApiResponse::success(order)))
}

/// GET /api/orders/{id}/fulfillments
#[utoipa::path(
    get,
    path = "/api/orders/{id}/fulfillments",
    responses((status = 200, description = "Fulfillment history for the order")),
    tag = "Admin"
)]
pub async fn order_fulfillments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<FulfillmentDetail>>>, CoreError> {
    let fulfillments = OrderRepository::fulfillments(state.db.pool(), id).await?;
    Ok(Json(ApiResponse::success(fulfillments)))
}

/// POST /api/orders/{id}/fulfill
///
/// Allocates batch stock to the order and mints one token per unit; on a
/// validation failure nothing is mutated.
#[utoipa::path(
    post,
    path = "/api/orders/{id}/fulfill",
    request_body = FulfillRequest,
    responses(
        (status = 200, description = "Allocation committed, tokens issued"),
        (status = 400, description = "Insufficient stock or over-allocation"),
        (status = 404, description = "Order or batch not found")
    ),
    tag = "Admin"
)]
pub async fn fulfill_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<FulfillRequest>,
) -> Result<Json<ApiResponse<FulfillResponse>>, CoreError> {
    let outcome = state
        .allocator
        .fulfill(id, req.batch_id, req.quantity)
        .await?;

    let tokens = outcome
        .tokens
        .into_iter()
        .map(|t| TokenView::from_issued(t, &state.base_url))
        .collect();

    Ok(Json(ApiResponse::success(FulfillResponse {
        fulfillment: outcome.fulfillment,
        order: outcome.order,
        tokens,
    })))
}

/// GET /api/stats
#[utoipa::path(
    get,
    path = "/api/stats",
    responses((status = 200, description = "Dashboard counts", body = StatsResponse)),
    tag = "Admin"
)]
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatsResponse>>, CoreError> {
    let pool = state.db.pool();
    let batches = BatchRepository::count(pool).await?;
    let orders = OrderRepository::count(pool).await?;
    let token_counts = token::counts(pool).await?;

    Ok(Json(ApiResponse::success(StatsResponse {
        batches,
        orders,
        tokens_issued: token_counts.issued,
        tokens_consumed: token_counts.consumed,
    })))
}
