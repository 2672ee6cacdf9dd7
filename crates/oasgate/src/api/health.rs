//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use super::router::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Active rules in the loaded ruleset.
    pub rules: usize,
}

/// GET /health
///
/// The engine is built before the server binds, so a running server is
/// always healthy.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        rules: state.gate.validator().engine().rule_count(),
    })
}
