//! Health check handlers.
//!
//! - `/health`: liveness probe, returns OK if the process is running
//! - `/ready`: readiness probe, checks the TTL store

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use crate::routes::EgState;

/// Readiness probe response body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness.
    pub status: &'static str,
    /// TTL store health, when checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<&'static str>,
    /// Generic failure description; details stay in the server logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe handler.
///
/// Does NOT check any dependencies; failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Probes the TTL store with a cheap read. The filter cannot make
/// revocation decisions without the store, so an unreachable store means
/// the gateway is not ready to admit traffic.
#[tracing::instrument(skip_all, name = "eg.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<EgState>>) -> impl IntoResponse {
    match state.store.get("readiness:probe").await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ready",
                store: Some("healthy"),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(target: "eg.health", "Readiness check failed: store error: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "not_ready",
                    store: Some("unhealthy"),
                    error: Some("Service dependencies unavailable".to_string()),
                }),
            )
        }
    }
}
