//! Secret types for keeping credentials out of logs.
//!
//! Re-exports from the [`secrecy`] crate, used across Gatehouse for the
//! shared signing secret, Redis URLs (which may embed credentials) and user
//! passwords in flight.
//!
//! `SecretString` implements `Debug` with redaction, so a struct that
//! derives `Debug` around a secret stays safe to trace. The inner value is
//! only reachable through an explicit [`ExposeSecret::expose_secret`] call
//! at the point of use, and the memory is zeroized on drop.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let signing_secret = SecretString::from("not-for-logs");
//! assert!(!format!("{signing_secret:?}").contains("not-for-logs"));
//! assert_eq!(signing_secret.expose_secret(), "not-for-logs");
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretString};
