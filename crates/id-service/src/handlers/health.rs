//! Health check handlers.
//!
//! - `/health`: liveness probe, returns OK if the process is running
//! - `/ready`: readiness probe, checks the TTL store

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::models::ReadinessResponse;
use crate::routes::AppState;

/// Liveness probe handler.
///
/// Does NOT check any dependencies; failure means the process is hung.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Probes the TTL store with a cheap read. Returns 200 if ready, 503 if
/// not. Error messages are intentionally generic; actual errors are
/// logged server-side.
#[tracing::instrument(skip_all, name = "id.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
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
            tracing::warn!(target: "id.health", "Readiness check failed: store error: {}", e);
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

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check().await;
        assert_eq!(result, "OK");
    }

    #[test]
    fn test_readiness_response_serialization() {
        let ready = ReadinessResponse {
            status: "ready",
            store: Some("healthy"),
            error: None,
        };
        let json = serde_json::to_string(&ready).unwrap();
        assert!(json.contains("\"status\":\"ready\""));
        assert!(json.contains("\"store\":\"healthy\""));
        assert!(!json.contains("\"error\""));

        let not_ready = ReadinessResponse {
            status: "not_ready",
            store: Some("unhealthy"),
            error: Some("Service dependencies unavailable".to_string()),
        };
        let json = serde_json::to_string(&not_ready).unwrap();
        assert!(json.contains("\"status\":\"not_ready\""));
        assert!(json.contains("\"error\":\"Service dependencies unavailable\""));
    }
}
