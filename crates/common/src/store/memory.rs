//! In-memory TTL store for tests and local development.

use super::TtlStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// [`TtlStore`] over a process-local map.
///
/// Entries expire lazily: a read past the deadline reports a miss and drops
/// the entry. Deadlines use the tokio clock, so paused-time tests can
/// advance expiry deterministically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TtlStore for MemoryStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let deadline = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, deadline)) if *deadline > now => return Ok(Some(value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Lapsed entry: drop it so the map does not grow without bound.
        // Re-check the deadline under the write lock in case of a
        // concurrent overwrite between the two lock acquisitions.
        let mut entries = self.entries.write().await;
        if let Some((_, deadline)) = entries.get(key) {
            if *deadline <= now {
                entries.remove(key);
            }
        }
        Ok(None)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
