//! TTL key-value capability backing revocation, sessions and codes.
//!
//! The production backend is Redis; tests and local development run on the
//! in-memory implementation. Consumers hold an `Arc<dyn TtlStore>` so the
//! backend stays a wiring decision made once at startup, and the typed
//! wrappers ([`RevocationStore`], [`SessionCache`]) own their key layout
//! and semantics on top of it.

mod memory;
mod redis;
mod revocation;
mod session;

#[cfg(any(test, feature = "test-utils"))]
mod failing;

pub use memory::MemoryStore;
pub use redis::{RedisStore, DEFAULT_OP_TIMEOUT};
pub use revocation::RevocationStore;
pub use session::{SessionCache, SessionEntry, SESSION_TTL};

#[cfg(any(test, feature = "test-utils"))]
pub use failing::FailingStore;

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

/// Bounded key-value operations with per-key expiry.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Store `value` under `key`, expiring after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch the live value under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Whether a live value exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
