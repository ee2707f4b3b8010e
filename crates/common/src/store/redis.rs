//! Redis-backed TTL store.

use super::TtlStore;
use crate::error::StoreError;
use crate::secret::{ExposeSecret, SecretString};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::future::Future;
use std::time::Duration;

/// Default per-operation deadline.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_millis(2000);

/// [`TtlStore`] over a multiplexed Redis connection.
///
/// Every operation runs under a deadline; an elapsed deadline surfaces as
/// [`StoreError::Timeout`] so callers on the authentication path fail
/// closed instead of hanging.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
    op_timeout: Duration,
}

impl RedisStore {
    /// Connect to the Redis instance at `redis_url`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the URL is rejected or the
    /// connection cannot be established.
    pub async fn connect(
        redis_url: &SecretString,
        op_timeout: Duration,
    ) -> Result<Self, StoreError> {
        // Note: Do NOT log the URL, it may embed credentials.
        let client = Client::open(redis_url.expose_secret()).map_err(|e| {
            tracing::error!(
                target: "common.store.redis",
                error = %e,
                "Failed to open Redis client"
            );
            StoreError::Backend(format!("failed to open client: {e}"))
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                tracing::error!(
                    target: "common.store.redis",
                    error = %e,
                    "Failed to establish Redis connection"
                );
                StoreError::Backend(format!("failed to connect: {e}"))
            })?;

        tracing::info!(target: "common.store.redis", "Connected to Redis");
        Ok(Self {
            connection,
            op_timeout,
        })
    }

    async fn run<T>(
        &self,
        fut: impl Future<Output = redis::RedisResult<T>> + Send,
    ) -> Result<T, StoreError> {
        with_deadline(self.op_timeout, fut).await
    }
}

/// Drive `fut` to completion within `deadline`, mapping both failure modes
/// into [`StoreError`].
async fn with_deadline<T>(
    deadline: Duration,
    fut: impl Future<Output = redis::RedisResult<T>> + Send,
) -> Result<T, StoreError> {
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StoreError::Backend(e.to_string())),
        Err(_) => Err(StoreError::Timeout),
    }
}

#[async_trait]
impl TtlStore for RedisStore {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        // SET with a zero expiry is an error in Redis; clamp to one second.
        let secs = ttl.as_secs().max(1);
        self.run(async move { conn.set_ex::<_, _, ()>(key, value, secs).await })
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection.clone();
        self.run(async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection.clone();
        self.run(async move { conn.exists::<_, bool>(key).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        self.run(async move { conn.del::<_, ()>(key).await }).await
    }
}
