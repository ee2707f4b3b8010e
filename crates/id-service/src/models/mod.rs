//! Data models for the Identity Controller.
//!
//! Account records, the session cache snapshot, and the wire DTOs for the
//! authentication endpoints. Request types holding passwords or codes
//! redact those fields in their `Debug` output.

use chrono::{DateTime, Utc};
use common::types::{Identity, SubjectId};
use serde::{Deserialize, Serialize};

// ===== Account models =====

/// Account lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// The account may authenticate.
    Active,
    /// The account is administratively blocked from authenticating.
    Disabled,
}

impl UserStatus {
    /// String form used in logs and metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
        }
    }

    /// Whether the account may authenticate.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A stored account.
#[derive(Clone)]
pub struct UserRecord {
    /// Stable account identifier.
    pub subject_id: SubjectId,
    /// Unique login name.
    pub username: String,
    /// Unique contact address, also the verification code target.
    pub email: String,
    /// bcrypt digest of the password.
    pub password_hash: String,
    /// Lifecycle status.
    pub status: UserStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

// Manual Debug so the password digest never reaches logs.
impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("subject_id", &self.subject_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl UserRecord {
    /// The identity embedded into tokens for this account.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.subject_id, self.username.clone())
    }

    /// The profile snapshot cached alongside the last issued token.
    #[must_use]
    pub fn profile(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            subject_id: self.subject_id,
            username: self.username.clone(),
            email: self.email.clone(),
            status: self.status,
        }
    }
}

/// Fields needed to create an account.
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Unique contact address.
    pub email: String,
    /// bcrypt digest of the password.
    pub password_hash: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Account view stored in the session cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Stable account identifier.
    pub subject_id: SubjectId,
    /// Login name at snapshot time.
    pub username: String,
    /// Contact address at snapshot time.
    pub email: String,
    /// Status at snapshot time; never authoritative.
    pub status: UserStatus,
}

// ===== Request DTOs =====

/// Registration request body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    /// Requested login name.
    pub username: String,
    /// Contact address the verification code was sent to.
    pub email: String,
    /// Requested password.
    pub password: String,
    /// Verification code proving control of `email`.
    pub code: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("code", &"[REDACTED]")
            .finish()
    }
}

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Refresh request body.
#[derive(Deserialize)]
pub struct RefreshRequest {
    /// A live refresh token.
    pub refresh_token: String,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Password change request body.
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password.
    pub old_password: String,
    /// Replacement password.
    pub new_password: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangePasswordRequest")
            .field("old_password", &"[REDACTED]")
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

/// Verification code request body.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    /// Address the code should be delivered to.
    pub target: String,
}

// ===== Response DTOs =====

/// Registration response body.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Identifier of the new account.
    pub subject_id: SubjectId,
    /// Login name of the new account.
    pub username: String,
}

/// Login response body.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Identifier of the authenticated account.
    pub subject_id: SubjectId,
    /// Login name of the authenticated account.
    pub subject_name: String,
    /// Short-lived token for request authentication.
    pub access_token: String,
    /// Long-lived token for minting replacement access tokens.
    pub refresh_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Refresh response body.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Replacement access token.
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Readiness probe response body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness.
    pub status: &'static str,
    /// TTL store health, when checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<&'static str>,
    /// Generic failure description; details stay in the server logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
