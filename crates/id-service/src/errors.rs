//! Error types for the Identity Controller.
//!
//! The service distinguishes failure causes internally (an unknown account
//! is not the same thing as a wrong password), but the HTTP boundary
//! collapses anything an attacker could use to enumerate accounts into one
//! response. `AccountNotFound` and `BadCredential` share a status, code
//! and message; the three token failures do too.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::error::{SigningError, StoreError, ValidationError};
use serde::Serialize;
use thiserror::Error;

use crate::repositories::users::UserStoreError;

/// Errors produced by the Identity Controller.
#[derive(Debug, Error)]
pub enum IdError {
    /// An account with the same username or email already exists.
    #[error("Account already exists")]
    DuplicateAccount,

    /// The verification code is missing, wrong or expired.
    #[error("Invalid verification proof")]
    InvalidProof,

    /// Username, email or password fails the account policy.
    #[error("Credential does not meet the account policy")]
    WeakCredential,

    /// The delivery target for a verification code is not usable.
    #[error("Invalid delivery target")]
    InvalidTarget,

    /// No account matches the presented username.
    #[error("Account not found")]
    AccountNotFound,

    /// The account exists but the password does not match.
    #[error("Bad credential")]
    BadCredential,

    /// The account is administratively disabled.
    #[error("Account is disabled")]
    Disabled,

    /// The token failed structural or signature checks, or is of the
    /// wrong kind.
    #[error("Invalid token")]
    InvalidToken,

    /// The token's lifetime has lapsed.
    #[error("Token expired")]
    TokenExpired,

    /// The token was revoked before its natural expiry.
    #[error("Token revoked")]
    TokenRevoked,

    /// The caller hit a rate limit.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The TTL store failed or timed out.
    #[error("Store error: {0}")]
    Store(String),

    /// Hashing or signing failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Unexpected internal state.
    #[error("Internal server error")]
    Internal,
}

impl From<StoreError> for IdError {
    fn from(err: StoreError) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<SigningError> for IdError {
    fn from(err: SigningError) -> Self {
        Self::Crypto(err.to_string())
    }
}

impl From<ValidationError> for IdError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Expired => Self::TokenExpired,
            ValidationError::Revoked => Self::TokenRevoked,
            // A store outage during validation rejects the token rather
            // than reporting an internal error: fail closed.
            ValidationError::Malformed
            | ValidationError::SignatureMismatch
            | ValidationError::WrongKind
            | ValidationError::Backend => Self::InvalidToken,
        }
    }
}

impl From<UserStoreError> for IdError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::Duplicate => Self::DuplicateAccount,
            UserStoreError::NotFound => Self::Internal,
            UserStoreError::Backend(reason) => Self::Store(reason),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Serialize)]
struct ErrorDetail {
    /// Error code (machine-readable).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IdError {
    /// HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }

    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            Self::DuplicateAccount => (
                StatusCode::CONFLICT,
                "DUPLICATE_ACCOUNT",
                "An account with this username or email already exists",
            ),
            Self::InvalidProof => (
                StatusCode::BAD_REQUEST,
                "INVALID_PROOF",
                "The verification code is missing, wrong or expired",
            ),
            Self::WeakCredential => (
                StatusCode::BAD_REQUEST,
                "WEAK_CREDENTIAL",
                "Credentials do not meet the account policy",
            ),
            Self::InvalidTarget => (
                StatusCode::BAD_REQUEST,
                "INVALID_TARGET",
                "The delivery target is not usable",
            ),
            // One response for both causes so callers cannot probe which
            // usernames exist.
            Self::AccountNotFound | Self::BadCredential => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password",
            ),
            Self::Disabled => (
                StatusCode::FORBIDDEN,
                "ACCOUNT_DISABLED",
                "The account is disabled",
            ),
            // One response for all token failures so callers cannot tell
            // a revoked token from an expired one.
            Self::InvalidToken | Self::TokenExpired | Self::TokenRevoked => (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                "The token is invalid or expired",
            ),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "Too many requests. Please try again later.",
            ),
            Self::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_ERROR",
                "An internal error occurred",
            ),
            Self::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CRYPTO_ERROR",
                "An internal cryptographic error occurred",
            ),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred",
            ),
        }
    }
}

impl IntoResponse for IdError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
