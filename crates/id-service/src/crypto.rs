//! Password hashing.
//!
//! Thin wrappers over bcrypt that translate its errors into [`IdError`],
//! plus the fixed dummy digest used to keep login timing uniform.

use crate::errors::IdError;

/// Fixed bcrypt digest verified when the account does not exist.
///
/// Running the verification against this digest keeps the unknown-user
/// path and the wrong-password path on the same timing profile, so the
/// login endpoint does not leak which usernames are registered.
pub const DUMMY_PASSWORD_HASH: &str =
    "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a";

/// Hash a password with the configured cost factor.
///
/// # Errors
///
/// Returns [`IdError::Crypto`] if bcrypt rejects the input.
pub fn hash_password(password: &str, cost: u32) -> Result<String, IdError> {
    bcrypt::hash(password, cost).map_err(|e| IdError::Crypto(e.to_string()))
}

/// Verify a password against a stored bcrypt digest.
///
/// # Errors
///
/// Returns [`IdError::Crypto`] if the stored digest is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, IdError> {
    bcrypt::verify(password, hash).map_err(|e| IdError::Crypto(e.to_string()))
}
