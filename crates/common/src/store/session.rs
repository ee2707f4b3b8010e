//! Session cache: last token and profile snapshot per subject.

use super::TtlStore;
use crate::error::StoreError;
use crate::types::SubjectId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Key prefix for session entries, completed by the subject id.
const SESSION_KEY_PREFIX: &str = "auth:session:";

/// Fixed session lifetime: 24 hours.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached login state for one subject.
///
/// The profile is whatever the owning service wants to snapshot; the cache
/// is generic over it and never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry<P> {
    /// Most recently issued access token.
    pub last_token: String,
    /// Profile snapshot taken at login time.
    pub profile: P,
}

/// Best-effort accelerator over the TTL store.
///
/// Never authoritative: a miss proves nothing about whether the subject
/// exists, and callers still check token expiry on a hit.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn TtlStore>,
    ttl: Duration,
}

impl SessionCache {
    /// Build a cache over `store` with the standard 24h entry lifetime.
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self {
            store,
            ttl: SESSION_TTL,
        }
    }

    /// Build a cache with a non-standard entry lifetime.
    #[must_use]
    pub fn with_ttl(store: Arc<dyn TtlStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Record `last_token` and `profile` for `subject`.
    ///
    /// # Errors
    ///
    /// Propagates store failures; login callers log and continue, because a
    /// cold cache only costs a lookup later.
    pub async fn put<P: Serialize + Sync>(
        &self,
        subject: SubjectId,
        last_token: &str,
        profile: &P,
    ) -> Result<(), StoreError> {
        let entry = SessionEntry {
            last_token: last_token.to_string(),
            profile,
        };
        let json = serde_json::to_string(&entry)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store.put(&session_key(subject), &json, self.ttl).await
    }

    /// Fetch the cached entry for `subject`, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures; callers treat them like a miss.
    pub async fn get<P: DeserializeOwned>(
        &self,
        subject: SubjectId,
    ) -> Result<Option<SessionEntry<P>>, StoreError> {
        match self.store.get(&session_key(subject)).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Drop the entry for `subject`. Dropping an absent entry is fine.
    ///
    /// # Errors
    ///
    /// Propagates store failures. Logout and password-change paths call
    /// this synchronously and must surface the failure.
    pub async fn invalidate(&self, subject: SubjectId) -> Result<(), StoreError> {
        self.store.delete(&session_key(subject)).await
    }
}

fn session_key(subject: SubjectId) -> String {
    format!("{SESSION_KEY_PREFIX}{subject}")
}
