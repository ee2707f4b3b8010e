//! Shared error taxonomy for the token contract.
//!
//! # Security
//!
//! Every [`ValidationError`] variant renders the identical client-facing
//! message. The reason a token was rejected is an internal matter: callers
//! log the variant server-side, and nothing distinguishable crosses the
//! wire. Returning distinct messages would let an attacker probe which
//! check a forged token failed.

use thiserror::Error;

/// Why a token failed validation.
///
/// Produced in a fixed order by the validator: structure and signature
/// first, then expiry, then kind, then revocation. The first failing check
/// wins, so a token that is both expired and revoked reports `Expired`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Structurally broken: over the size cap, not three segments, bad
    /// base64 or JSON, or an unexpected algorithm header.
    #[error("The token is invalid or expired")]
    Malformed,

    /// Signature does not verify against the shared secret.
    #[error("The token is invalid or expired")]
    SignatureMismatch,

    /// `exp` is at or before the validation instant.
    #[error("The token is invalid or expired")]
    Expired,

    /// Well-formed and live, but minted as the other kind.
    #[error("The token is invalid or expired")]
    WrongKind,

    /// Present in the revocation denylist.
    #[error("The token is invalid or expired")]
    Revoked,

    /// The denylist could not be consulted; authentication fails closed.
    #[error("The token is invalid or expired")]
    Backend,
}

/// Token signing failed.
///
/// Practically unreachable for HMAC over an in-memory key, but the issuer
/// still propagates it instead of panicking.
#[derive(Error, Debug)]
#[error("failed to sign token")]
pub struct SigningError(#[from] jsonwebtoken::errors::Error);

/// TTL store operation failed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend rejected or dropped the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// Operation exceeded its deadline.
    #[error("store operation timed out")]
    Timeout,

    /// Stored value could not be serialized or deserialized.
    #[error("store serialization error: {0}")]
    Serialization(String),
}
