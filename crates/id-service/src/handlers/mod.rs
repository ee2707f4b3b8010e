//! HTTP request handlers for the Identity Controller.

pub mod auth_handler;
pub mod health;
pub mod metrics;

pub use auth_handler::{change_password, login, logout, refresh, register, request_code};
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
