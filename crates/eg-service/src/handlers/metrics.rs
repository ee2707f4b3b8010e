//! Prometheus metrics endpoint handler.

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// Serve the current metrics snapshot in Prometheus text exposition
/// format.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
