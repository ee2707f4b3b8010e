//! Observability utilities.
//!
//! Correlation hashing for identifiers that must not appear in logs, and
//! the error categories used as metrics labels.

use sha2::{Digest, Sha256};

use crate::errors::IdError;

/// Prometheus metrics.
pub mod metrics;

/// Hash an identifier for log correlation.
///
/// Returns the first 8 hex characters of the SHA-256 digest. Enough to
/// correlate repeated failures for one username across log lines without
/// ever writing the username itself.
#[must_use]
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(&digest[..4])
}

/// Coarse error category for metrics labels.
///
/// Categories are bounded and stable; individual error variants are not,
/// and must never become label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller could not be authenticated.
    Authentication,
    /// The request violated an account or verification policy.
    Policy,
    /// The caller hit a rate limit.
    RateLimit,
    /// The service itself failed.
    Internal,
}

impl ErrorCategory {
    /// Label value for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Policy => "policy",
            Self::RateLimit => "rate_limit",
            Self::Internal => "internal",
        }
    }
}

impl From<&IdError> for ErrorCategory {
    fn from(err: &IdError) -> Self {
        match err {
            IdError::AccountNotFound
            | IdError::BadCredential
            | IdError::Disabled
            | IdError::InvalidToken
            | IdError::TokenExpired
            | IdError::TokenRevoked => Self::Authentication,
            IdError::DuplicateAccount
            | IdError::InvalidProof
            | IdError::WeakCredential
            | IdError::InvalidTarget => Self::Policy,
            IdError::RateLimited => Self::RateLimit,
            IdError::Store(_) | IdError::Crypto(_) | IdError::Internal => Self::Internal,
        }
    }
}
