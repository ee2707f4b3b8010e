//! Shared authentication contract for Gatehouse services.
//!
//! Every token-related type lives here exactly once: the claims model, the
//! signing authority, the issuer, the ordered validator, and the TTL-store
//! backed revocation and session components. The identity controller and the
//! edge gateway both consume this crate, so the two ends of the platform
//! cannot drift apart on what a token means.

#![warn(clippy::pedantic)]

/// Module for the claims model and token kinds
pub mod claims;

/// Module for the perimeter rejection envelope
pub mod envelope;

/// Module for the shared error taxonomy
pub mod error;

/// Module for identity propagation header names
pub mod headers;

/// Module for token issuance
pub mod issuer;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for HMAC token signing and verification
pub mod signing;

/// Module for the TTL key-value capability and its consumers
pub mod store;

/// Module for identity types
pub mod types;

/// Module for ordered token validation
pub mod validator;
