//! Axum router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use oasgate_core::PublishGate;
use oasgate_telemetry::MetricsRegistry;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use scalar_api_reference::scalar_html_default;

use super::upload::UploadLimits;
use super::{health, metrics, openapi};

/// The service's own OpenAPI description, embedded at compile time.
const OPENAPI_SPEC: &str = include_str!("../../openapi.yaml");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Validation pipeline and publish action, built once at startup.
    pub gate: PublishGate,
    pub metrics: Arc<MetricsRegistry>,
    pub limits: UploadLimits,
}

/// Handler to serve the OpenAPI specification.
async fn openapi_spec() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/yaml")],
        OPENAPI_SPEC,
    )
}

/// Handler to serve the Scalar API documentation UI.
async fn api_docs() -> Html<String> {
    let config = serde_json::json!({
        "spec": {
            "url": "/openapi"
        },
        "theme": "purple",
        "layout": "modern",
        "hideModels": false,
        "hideDownloadButton": false
    });

    Html(scalar_html_default(&config))
}

/// Create the API router with all routes.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let body_limit = state.limits.max_request_bytes();

    Router::new()
        // OpenAPI spec and documentation
        .route("/openapi", get(openapi_spec))
        .route("/docs", get(api_docs))
        // Operations
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics))
        // Documents
        .route("/v1/openapi/validate", post(openapi::validate_document))
        .route("/v1/openapi/publish", post(openapi::publish_document))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
