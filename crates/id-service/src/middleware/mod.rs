//! Request middleware.

/// Bearer token authentication for protected routes.
pub mod auth;

/// HTTP metrics capture.
pub mod http_metrics;

pub use auth::{require_auth, AuthState};
pub use http_metrics::http_metrics_middleware;
