//! Token revocation denylist.

use super::TtlStore;
use crate::error::StoreError;
use std::sync::Arc;
use std::time::Duration;

/// Key prefix for revocation entries. The rest of the key is the exact
/// token string being retired.
const REVOKED_KEY_PREFIX: &str = "auth:revoked:";

/// Denylist of tokens retired before their natural expiry.
///
/// An entry lives exactly as long as the token it shadows: once the token
/// expires on its own, the validator's expiry check rejects it regardless,
/// so the entry is allowed to lapse.
#[derive(Clone)]
pub struct RevocationStore {
    store: Arc<dyn TtlStore>,
}

impl RevocationStore {
    /// Build a denylist over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self { store }
    }

    /// Revoke `token` for `remaining` seconds.
    ///
    /// A non-positive remainder means the token is already expired and the
    /// write is skipped. Revoking the same token again refreshes the entry,
    /// which is harmless because the remainder only ever shrinks.
    ///
    /// # Errors
    ///
    /// Propagates backend failures. Callers on the logout path must treat
    /// them as fatal for the request rather than silently skipping the
    /// denylist write.
    pub async fn revoke(&self, token: &str, remaining: i64) -> Result<(), StoreError> {
        if remaining <= 0 {
            tracing::debug!(
                target: "common.store.revocation",
                "Skipping revocation of already-expired token"
            );
            return Ok(());
        }
        // Safe cast: remaining is checked positive above.
        #[allow(clippy::cast_sign_loss)]
        let ttl = Duration::from_secs(remaining as u64);
        self.store.put(&revocation_key(token), "1", ttl).await
    }

    /// Whether `token` is currently revoked.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; the validator maps them to a
    /// fail-closed rejection.
    pub async fn is_revoked(&self, token: &str) -> Result<bool, StoreError> {
        self.store.exists(&revocation_key(token)).await
    }
}

fn revocation_key(token: &str) -> String {
    format!("{REVOKED_KEY_PREFIX}{token}")
}
