//! HTTP gateway
//!
//! Three surfaces share one router: the administrative API, the public scan
//! endpoints, and the shared-secret-gated external certificate API.

pub mod admin;
pub mod cert;
pub mod openapi;
pub mod scan;
pub mod types;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{Next, from_fn_with_state},
    response::Response,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::allocation::Allocator;
use crate::certificate::CertTracker;
use crate::config::AppConfig;
use crate::error::CoreError;
use crate::store::Database;
use crate::token::Redeemer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub allocator: Arc<Allocator>,
    pub redeemer: Arc<Redeemer>,
    pub tracker: Arc<CertTracker>,
    /// Public base URL used to derive redemption links
    pub base_url: String,
    /// Shared secret for the external certificate caller
    pub cert_api_key: String,
}

impl AppState {
    pub fn new(db: Arc<Database>, config: &AppConfig) -> Self {
        Self {
            allocator: Arc::new(Allocator::new(db.clone())),
            redeemer: Arc::new(Redeemer::new(db.clone())),
            tracker: Arc::new(CertTracker::new(db.clone())),
            db,
            base_url: config.server.base_url.trim_end_matches('/').to_string(),
            cert_api_key: config.cert_api.api_key.clone(),
        }
    }
}

/// Axum middleware gating the external certificate API.
///
/// Exact-match shared secret, supplied per request via `x-api-key` header or
/// `api_key` query parameter.
pub async fn cert_auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, CoreError> {
    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let query_key = request.uri().query().and_then(|q| {
        q.split('&')
            .find_map(|pair| pair.strip_prefix("api_key=").map(str::to_string))
    });

    match header_key.or(query_key) {
        Some(supplied) if supplied == state.cert_api_key => Ok(next.run(request).await),
        _ => Err(CoreError::Unauthorized),
    }
}

/// Build the complete router
pub fn build_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // External certificate routes (shared-secret required)
    // ==========================================================================
    let cert_routes = Router::new()
        .route("/pending", get(cert::list_pending))
        .route("/update-status", post(cert::update_status))
        .route("/mark-processing", post(cert::mark_processing))
        .route("/mark-minted", post(cert::mark_minted))
        .route("/mark-failed", post(cert::mark_failed))
        .route("/retry-failed", post(cert::retry_failed))
        .route("/stats", get(cert::stats))
        .route("/token/{token}", get(cert::get_token))
        .layer(from_fn_with_state(state.clone(), cert_auth_middleware));

    // ==========================================================================
    // Administrative routes (consumed by the presentation layer)
    // ==========================================================================
    let admin_routes = Router::new()
        .route(
            "/producers",
            post(admin::create_producer).get(admin::list_producers),
        )
        .route(
            "/requesters",
            post(admin::create_requester).get(admin::list_requesters),
        )
        .route("/batches", post(admin::create_batch).get(admin::list_batches))
        .route("/batches/{id}/replenish", post(admin::replenish_batch))
        .route("/orders", post(admin::create_order).get(admin::list_orders))
        .route("/orders/{id}", get(admin::get_order))
        .route("/orders/{id}/fulfillments", get(admin::order_fulfillments))
        .route("/orders/{id}/fulfill", post(admin::fulfill_order))
        .route("/stats", get(admin::stats));

    Router::new()
        .route("/health", get(admin::health))
        .nest("/api", admin_routes)
        .nest("/api/cert", cert_routes)
        // Public scan surface (unauthenticated token holder)
        .route("/scan/{token}", get(scan::consume))
        .route("/scan/info/{token}", get(scan::info))
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Bind and serve until shutdown
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API docs: http://{}/docs", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
