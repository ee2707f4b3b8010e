//! HTTP routes for the Edge Gateway.
//!
//! Defines the Axum router and application state.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use common::store::TtlStore;
use common::validator::TokenValidator;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AllowList;
use crate::handlers;
use crate::middleware::{authenticate, http_metrics_middleware, FilterState};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct EgState {
    /// Validator sharing the platform signing secret and denylist.
    pub validator: TokenValidator,

    /// Path prefixes exempt from token validation.
    pub allow_list: AllowList,

    /// TTL store handle, probed by the readiness check.
    pub store: Arc<dyn TtlStore>,
}

/// Build the application routes.
///
/// - `/health` - liveness probe (simple "OK") - public, unversioned
/// - `/ready` - readiness probe (checks the TTL store) - public, unversioned
/// - `/metrics` - Prometheus metrics endpoint - public, unversioned
/// - `/api/v1/session/identity` - echo the authenticated subject
///
/// The token filter wraps the merged router, so every path reaching the
/// gateway is filtered before routing; unmatched paths answer 401 without
/// a token and 404 with one. The public probes survive the filter through
/// the allow list, not through route placement.
pub fn build_routes(state: Arc<EgState>, metrics_handle: PrometheusHandle) -> Router {
    let filter_state = Arc::new(FilterState {
        validator: state.validator.clone(),
        allow_list: state.allow_list.clone(),
    });

    let service_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/session/identity", get(handlers::session_identity))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. authenticate - Token filter (innermost; also guards the 404 fallback)
    // 2. TimeoutLayer - Timeout the request
    // 3. TraceLayer - Log request details
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    service_routes
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(filter_state, authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eg_state_is_clone() {
        // Required for Axum's State extractor.
        fn assert_clone<T: Clone>() {}
        assert_clone::<EgState>();
    }
}
