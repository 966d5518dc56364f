//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:3000/docs`
//! - OpenAPI JSON: `http://localhost:3000/api-docs/openapi.json`

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::types::{
    CreateBatchRequest, CreateOrderRequest, CreateProducerRequest, CreateRequesterRequest,
    FulfillRequest, HealthResponse, MarkFailedRequest, MarkMintedRequest, ReplenishRequest,
    ScanInfoResponse, ScanResponse, StatsResponse, TokenRequest, TokenView,
    UpdateCertStatusRequest,
};
use crate::certificate::{CertStats, PendingCert, TokenWithCert};

/// Shared-secret security scheme for the external certificate API
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cert_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-api-key",
                    "Exact-match shared secret for the external certificate caller. \
                     May also be supplied as the `api_key` query parameter.",
                ))),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veritrace API",
        version = "0.1.0",
        description = "Batch-to-order allocation, single-use redemption tokens and certificate lifecycle tracking.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Development"),
    ),
    paths(
        // Admin surface
        crate::api::admin::health,
        crate::api::admin::create_producer,
        crate::api::admin::list_producers,
        crate::api::admin::create_requester,
        crate::api::admin::list_requesters,
        crate::api::admin::create_batch,
        crate::api::admin::list_batches,
        crate::api::admin::replenish_batch,
        crate::api::admin::create_order,
        crate::api::admin::list_orders,
        crate::api::admin::get_order,
        crate::api::admin::order_fulfillments,
        crate::api::admin::fulfill_order,
        crate::api::admin::stats,
        // Public scan surface
        crate::api::scan::consume,
        crate::api::scan::info,
        // External certificate API
        crate::api::cert::list_pending,
        crate::api::cert::update_status,
        crate::api::cert::mark_processing,
        crate::api::cert::mark_minted,
        crate::api::cert::mark_failed,
        crate::api::cert::retry_failed,
        crate::api::cert::stats,
        crate::api::cert::get_token,
    ),
    components(
        schemas(
            HealthResponse,
            StatsResponse,
            CreateProducerRequest,
            CreateRequesterRequest,
            CreateBatchRequest,
            ReplenishRequest,
            CreateOrderRequest,
            FulfillRequest,
            TokenView,
            ScanResponse,
            ScanInfoResponse,
            UpdateCertStatusRequest,
            TokenRequest,
            MarkMintedRequest,
            MarkFailedRequest,
            CertStats,
            PendingCert,
            TokenWithCert,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Admin", description = "Administrative data entry and fulfillment"),
        (name = "Scan", description = "Public token redemption"),
        (name = "Certificate", description = "External certificate lifecycle reporting"),
    )
)]
pub struct ApiDoc;
