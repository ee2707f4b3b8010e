//! Business logic for authentication operations.

/// Account and token orchestration.
pub mod auth_service;

/// Verification codes for proof of control.
pub mod verification_service;

pub use auth_service::AuthService;
pub use verification_service::VerificationService;
