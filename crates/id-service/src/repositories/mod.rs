//! Storage capabilities for accounts and audit events.

/// Audit event sink.
pub mod audit;

/// Account storage.
pub mod users;

pub use audit::{AuditEvent, AuditKind, AuditLog, TracingAuditLog};
pub use users::{InMemoryUserStore, UserStore, UserStoreError};
