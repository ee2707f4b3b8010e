//! HTTP routes for the Identity Controller.
//!
//! Defines the Axum router and application state.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, routing::post, Router};
use common::store::TtlStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use crate::services::AuthService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authentication orchestrator.
    pub auth: AuthService,

    /// TTL store handle, probed by the readiness check.
    pub store: Arc<dyn TtlStore>,
}

/// Build the application routes.
///
/// - `/health` - liveness probe (simple "OK") - public, unversioned
/// - `/ready` - readiness probe (checks the TTL store) - public, unversioned
/// - `/metrics` - Prometheus metrics endpoint - public, unversioned
/// - `/api/v1/auth/register` - create an account
/// - `/api/v1/auth/login` - authenticate, mint a token pair
/// - `/api/v1/auth/refresh` - mint a replacement access token
/// - `/api/v1/auth/code` - request a verification code
/// - `/api/v1/auth/logout` - revoke the presented token
/// - `/api/v1/auth/password` - change password (requires authentication)
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        validator: state.auth.validator(),
    });

    // Public routes. Logout is deliberately here: it does its own lenient
    // token handling so an expired token still logs out.
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/auth/register", post(handlers::register))
        .route("/api/v1/auth/login", post(handlers::login))
        .route("/api/v1/auth/refresh", post(handlers::refresh))
        .route("/api/v1/auth/code", post(handlers::request_code))
        .route("/api/v1/auth/logout", post(handlers::logout))
        .with_state(state.clone());

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/api/v1/auth/password", post(handlers::change_password))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
