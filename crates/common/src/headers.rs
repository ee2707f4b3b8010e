//! Identity propagation header names.
//!
//! The edge gateway is the sole ingress; after it validates a token it
//! strips any inbound copies of these headers and injects the values from
//! the validated identity. Downstream services trust them on that basis
//! and never parse tokens themselves.
//!
//! Names are lowercase so they can back `HeaderName::from_static`.

/// Standard authorization header carrying the bearer token.
pub const AUTHORIZATION: &str = "authorization";

/// Bearer scheme prefix, including the trailing space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Propagated subject id, set by the edge gateway after validation.
pub const X_USER_ID: &str = "x-user-id";

/// Propagated subject name, set by the edge gateway after validation.
pub const X_USERNAME: &str = "x-username";
