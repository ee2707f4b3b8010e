//! Rejection envelope returned at the perimeter.
//!
//! Every filter-level rejection shares one JSON shape regardless of why the
//! request was refused. The HTTP status is mirrored in `code`, the message
//! is generic, and no stack trace or sub-reason ever crosses the wire.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Body of a perimeter rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Mirrors the HTTP status code of the response.
    pub code: u16,
    /// Generic description; never the underlying rejection reason.
    pub message: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Path of the rejected request.
    pub path: String,
}

impl ErrorBody {
    /// Build an envelope for `code` at `path`, stamped with the current time.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            timestamp: Utc::now().timestamp_millis(),
            path: path.into(),
        }
    }

    /// The uniform authentication rejection.
    #[must_use]
    pub fn unauthorized(path: impl Into<String>) -> Self {
        Self::new(401, "The token is invalid or expired", path)
    }

    /// The uniform envelope for perimeter-internal failures.
    #[must_use]
    pub fn internal(path: impl Into<String>) -> Self {
        Self::new(500, "An internal error occurred", path)
    }
}
