//! Metrics definitions for the Edge Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `eg_` prefix for the Edge Gateway
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: fixed route table plus `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: 4 values (allowed, rejected, bypassed, errored)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Buckets sit lower than
/// the Identity Controller's: the hot path here is one HMAC check and one
/// denylist read.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("eg_http_request".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `eg_http_requests_total`, `eg_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// This captures ALL HTTP responses including filter rejections and
/// framework-level errors like 404 and 405.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    // Normalize endpoint to prevent cardinality explosion
    let normalized_endpoint = normalize_endpoint(endpoint);

    let status = categorize_status_code(status_code);

    histogram!("eg_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("eg_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion.
///
/// The gateway's own route table is entirely static; arbitrary inbound
/// paths (the filter sees everything) collapse to `/other`.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" | "/api/v1/session/identity" => path.to_string(),
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Filter Decision Metrics
// ============================================================================

/// Record a perimeter filter decision.
///
/// Metric: `eg_auth_decisions_total`
/// Labels: `outcome` ("allowed", "rejected", "bypassed", "errored")
///
/// "bypassed" counts allow-listed paths that skipped validation;
/// "errored" counts validated identities that could not be propagated.
pub fn record_auth_decision(outcome: &str) {
    counter!("eg_auth_decisions_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
