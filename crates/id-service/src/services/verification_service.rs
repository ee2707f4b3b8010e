//! Verification codes.
//!
//! Short-lived numeric codes proving control of a delivery target (an
//! email address) during registration. Codes live in the TTL store under
//! `auth:code:<target>`; a companion `auth:code_limit:<target>` key
//! throttles re-sends. A code is single use: checking it successfully
//! consumes it.
//!
//! Code delivery (mail, SMS) is a deployment integration; this service
//! only mints, stores and checks.

use std::sync::Arc;
use std::time::Duration;

use common::store::TtlStore;
use rand::Rng;

use crate::errors::IdError;
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_verification_code;

// ===== Constants =====

/// Key prefix for live codes, completed by the delivery target.
pub const CODE_KEY_PREFIX: &str = "auth:code:";

/// Key prefix for the re-send limiter.
pub const CODE_LIMIT_KEY_PREFIX: &str = "auth:code_limit:";

/// How long a code stays valid.
pub const CODE_TTL: Duration = Duration::from_secs(5 * 60);

/// Minimum interval between two codes for the same target.
pub const RESEND_INTERVAL: Duration = Duration::from_secs(60);

/// Number of digits in a code.
pub const CODE_LENGTH: usize = 6;

/// Issues and checks verification codes.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn TtlStore>,
}

impl VerificationService {
    /// Create a service over the given TTL store.
    #[must_use]
    pub fn new(store: Arc<dyn TtlStore>) -> Self {
        Self { store }
    }

    /// Issue a fresh code for `target`.
    ///
    /// Returns the code so the caller can hand it to a delivery channel.
    /// The code value itself is never logged.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::RateLimited`] inside the re-send window and
    /// [`IdError::Store`] if the TTL store fails.
    pub async fn issue(&self, target: &str) -> Result<String, IdError> {
        let limit_key = format!("{CODE_LIMIT_KEY_PREFIX}{target}");
        if self.store.exists(&limit_key).await? {
            tracing::debug!(
                target: "id.verification",
                target_hash = %hash_for_correlation(target),
                "Re-send limit hit"
            );
            record_verification_code("rate_limited");
            return Err(IdError::RateLimited);
        }

        let code = generate_code();
        self.store
            .put(&format!("{CODE_KEY_PREFIX}{target}"), &code, CODE_TTL)
            .await?;
        self.store.put(&limit_key, "1", RESEND_INTERVAL).await?;

        tracing::info!(
            target: "id.verification",
            target_hash = %hash_for_correlation(target),
            "Issued verification code"
        );
        record_verification_code("issued");
        Ok(code)
    }

    /// Check `code` against the live code for `target`, consuming it on
    /// success.
    ///
    /// An absent, lapsed or mismatched code all produce the same
    /// [`IdError::InvalidProof`]; callers cannot distinguish which.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidProof`] when the code does not check out
    /// and [`IdError::Store`] if the TTL store fails.
    pub async fn check(&self, target: &str, code: &str) -> Result<(), IdError> {
        let key = format!("{CODE_KEY_PREFIX}{target}");
        match self.store.get(&key).await? {
            Some(stored) if stored == code => {
                // Single use: a code that just verified must never verify
                // again.
                self.store.delete(&key).await?;
                record_verification_code("verified");
                Ok(())
            }
            _ => {
                tracing::debug!(
                    target: "id.verification",
                    target_hash = %hash_for_correlation(target),
                    "Verification code rejected"
                );
                record_verification_code("rejected");
                Err(IdError::InvalidProof)
            }
        }
    }
}

/// Generate a uniformly random numeric code, zero padded to
/// [`CODE_LENGTH`] digits.
fn generate_code() -> String {
    let n: u32 = rand::rngs::OsRng.gen_range(0..1_000_000);
    format!("{n:0width$}", width = CODE_LENGTH)
}
