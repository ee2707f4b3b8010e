//! Metrics definitions for the Identity Controller.
//!
//! All metrics follow Prometheus naming conventions:
//! - `id_` prefix for the Identity Controller
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: fixed route table plus `/other`
//! - `status`: 3 values (success, error, timeout)
//! - `operation`: bounded by code (register, login, refresh, ...)
//! - `error_type`: bounded by [`ErrorCategory`](super::ErrorCategory)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Auth operation buckets
/// stretch past two seconds because the login path contains a bcrypt
/// verification at production cost.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("id_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.000, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("id_auth_op".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500,
            ],
        )
        .map_err(|e| format!("Failed to set auth operation buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `id_http_requests_total`, `id_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// This captures ALL HTTP responses including framework-level errors like
/// 415 Unsupported Media Type, 400 JSON parse errors, 404 and 405.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    // Normalize endpoint to prevent cardinality explosion
    let normalized_endpoint = normalize_endpoint(endpoint);

    let status = categorize_status_code(status_code);

    histogram!("id_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("id_http_requests_total",
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
/// The route table is entirely static, so anything unknown collapses to
/// `/other`.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" | "/ready" | "/metrics" | "/api/v1/auth/register" | "/api/v1/auth/login"
        | "/api/v1/auth/refresh" | "/api/v1/auth/logout" | "/api/v1/auth/password"
        | "/api/v1/auth/code" => path.to_string(),
        _ => "/other".to_string(),
    }
}

// ============================================================================
// Authentication Operation Metrics
// ============================================================================

/// Record an authentication operation outcome.
///
/// Metric: `id_auth_ops_total`, `id_auth_op_duration_seconds`
/// Labels: `operation`, `status`
///
/// Operations: register, login, refresh, logout, change_password,
/// request_code. Status: "success" or "error".
pub fn record_auth_op(operation: &str, status: &str, duration: Duration) {
    histogram!("id_auth_op_duration_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("id_auth_ops_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record a minted token.
///
/// Metric: `id_tokens_issued_total`
/// Labels: `kind` ("access" or "refresh")
pub fn record_token_issued(kind: &str) {
    counter!("id_tokens_issued_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record a revocation attempt.
///
/// Metric: `id_revocations_total`
/// Labels: `status` ("success" or "error")
///
/// A logout whose token already lapsed still counts as "success"; the
/// denylist write is skipped but the token is just as dead.
pub fn record_revocation(status: &str) {
    counter!("id_revocations_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Session Cache Metrics
// ============================================================================

/// Record a session cache operation.
///
/// Metric: `id_session_cache_ops_total`
/// Labels: `operation` ("put" or "invalidate"), `status`
pub fn record_session_cache(operation: &str, status: &str) {
    counter!("id_session_cache_ops_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Audit Metrics
// ============================================================================

/// Record an audit sink failure.
///
/// Metric: `id_audit_log_failures_total`
///
/// The operation that produced the event still succeeds; this counter is
/// what makes the dropped events visible.
pub fn record_audit_failure() {
    counter!("id_audit_log_failures_total").increment(1);
}

// ============================================================================
// Verification Code Metrics
// ============================================================================

/// Record a verification code lifecycle event.
///
/// Metric: `id_verification_codes_total`
/// Labels: `event` ("issued", "verified", "rejected", "rate_limited")
pub fn record_verification_code(event: &str) {
    counter!("id_verification_codes_total",
        "event" => event.to_string()
    )
    .increment(1);
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Record error by category.
///
/// Metric: `id_errors_total`
/// Labels: `operation`, `error_type`, `status_code`
///
/// The `error_type` label carries the bounded
/// [`ErrorCategory`](super::ErrorCategory) string, never the raw error
/// variant.
pub fn record_error(operation: &str, error_type: &str, status_code: u16) {
    counter!("id_errors_total",
        "operation" => operation.to_string(),
        "error_type" => error_type.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
