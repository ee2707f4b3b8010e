//! Always-failing TTL store for fail-closed tests.

use super::TtlStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

/// [`TtlStore`] whose every operation fails, for exercising the
/// infrastructure-outage paths: validation must reject, logout must error,
/// caching must degrade without taking the request down.
#[derive(Debug, Clone, Copy)]
pub struct FailingStore {
    times_out: bool,
}

impl FailingStore {
    /// Fail every operation with a backend error.
    #[must_use]
    pub fn backend() -> Self {
        Self { times_out: false }
    }

    /// Fail every operation with a timeout.
    #[must_use]
    pub fn timeout() -> Self {
        Self { times_out: true }
    }

    fn error(self) -> StoreError {
        if self.times_out {
            StoreError::Timeout
        } else {
            StoreError::Backend("induced backend failure".to_string())
        }
    }
}

#[async_trait]
impl TtlStore for FailingStore {
    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(self.error())
    }

    async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(self.error())
    }
}
