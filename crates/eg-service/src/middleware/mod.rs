//! Request middleware.

/// Perimeter token filter.
pub mod auth;

/// HTTP metrics capture.
pub mod http_metrics;

pub use auth::{authenticate, FilterState};
pub use http_metrics::http_metrics_middleware;
