//! Observability utilities.

/// Prometheus metrics.
pub mod metrics;
