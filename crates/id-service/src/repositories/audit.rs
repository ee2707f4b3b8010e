//! Audit event sink.
//!
//! Authentication operations emit audit events describing what happened
//! to which account. Recording is deliberately decoupled from the
//! operations themselves: a sink failure is logged and counted, never
//! allowed to roll back a login that already succeeded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::types::SubjectId;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Registered,
    LoginSucceeded,
    LoginFailed,
    LoggedOut,
    TokenRefreshed,
    PasswordChanged,
}

impl AuditKind {
    /// String form used in log fields.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::LoginSucceeded => "login_succeeded",
            Self::LoginFailed => "login_failed",
            Self::LoggedOut => "logged_out",
            Self::TokenRefreshed => "token_refreshed",
            Self::PasswordChanged => "password_changed",
        }
    }
}

/// One audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Unique event identifier for cross-system correlation.
    pub event_id: Uuid,
    /// What happened.
    pub kind: AuditKind,
    /// Affected account, when one was resolved.
    pub subject_id: Option<SubjectId>,
    /// Correlation hash of the username involved, never the plaintext.
    pub username_hash: String,
    /// When it happened.
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    /// Build an event stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(kind: AuditKind, subject_id: Option<SubjectId>, username_hash: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            subject_id,
            username_hash,
            at: Utc::now(),
        }
    }
}

/// Audit sink failure.
#[derive(Debug, Error)]
#[error("audit sink error: {0}")]
pub struct AuditError(pub String);

/// Destination for audit events.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record one event.
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

/// Default sink: structured log lines under the `id.audit` target.
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        tracing::info!(
            target: "id.audit",
            event_id = %event.event_id,
            kind = event.kind.as_str(),
            subject_id = ?event.subject_id,
            username_hash = %event.username_hash,
            "Audit event"
        );
        Ok(())
    }
}
