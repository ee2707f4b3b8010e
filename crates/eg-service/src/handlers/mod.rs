//! HTTP request handlers for the Edge Gateway.

pub mod health;
pub mod metrics;
pub mod session;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use session::session_identity;
