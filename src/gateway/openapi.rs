//! OpenAPI / Swagger UI Documentation
//!
//! This module provides auto-generated OpenAPI 3.0 documentation for the
//! CellFi API.
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

// Import handler types for schema registration
use crate::gateway::handlers::{HealthResponse, WebhookAck};
use crate::sms::{WebhookMessage, WebhookPayload};

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "CellFi SMS Wallet API",
        version = "1.0.0",
        description = "Stablecoin wallet driven over SMS: registration, cosigned transfers, and payment requests from any feature phone.",
        contact(
            name = "API Support",
            url = "https://github.com/cellfi/cellfi"
        ),
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::webhook::sms_webhook,
        crate::gateway::handlers::health::health_check,
    ),
    components(
        schemas(
            WebhookPayload,
            WebhookMessage,
            WebhookAck,
            HealthResponse,
        )
    ),
    tags(
        (name = "Webhook", description = "Inbound SMS from the gateway"),
        (name = "System", description = "Health checks and system info"),
        (name = "Mock", description = "Dev-only SMS injection (mock-api feature)")
    )
)]
pub struct ApiDoc;

/// Mock endpoints, documented only when compiled in
#[cfg(feature = "mock-api")]
#[derive(OpenApi)]
#[openapi(
    paths(crate::gateway::handlers::mock::mock_sms),
    components(
        schemas(
            crate::gateway::handlers::mock::MockSmsRequest,
            crate::gateway::handlers::mock::MockSmsData,
            crate::gateway::handlers::mock::MockNotification,
        )
    )
)]
struct MockApiDoc;

/// Full specification for the running binary's feature set
pub fn api_spec() -> utoipa::openapi::OpenApi {
    #[allow(unused_mut)]
    let mut spec = ApiDoc::openapi();
    #[cfg(feature = "mock-api")]
    spec.merge(MockApiDoc::openapi());
    spec
}
