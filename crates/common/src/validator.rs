//! Ordered token validation.
//!
//! One validator for the whole platform. Checks run in a fixed order so a
//! token in several bad states reports deterministically: structure and
//! signature first, then expiry, then kind, then revocation. Only a token
//! that passes everything yields an identity.
//!
//! Validation is read-only. It never writes to any store, never panics,
//! and returns typed results for every outcome; when the revocation
//! backend cannot be consulted the token is rejected, not waved through.

use crate::claims::TokenKind;
use crate::error::ValidationError;
use crate::signing::SigningAuthority;
use crate::store::RevocationStore;
use crate::types::Identity;
use chrono::Utc;

/// Validates tokens against the shared contract and the revocation
/// denylist.
#[derive(Clone)]
pub struct TokenValidator {
    authority: SigningAuthority,
    revocations: RevocationStore,
}

impl TokenValidator {
    /// Build a validator over the shared authority and denylist.
    #[must_use]
    pub fn new(authority: SigningAuthority, revocations: RevocationStore) -> Self {
        Self {
            authority,
            revocations,
        }
    }

    /// Validate `token`, requiring it to be of `expected` kind.
    ///
    /// # Errors
    ///
    /// The first failing check wins: [`ValidationError::Malformed`] or
    /// [`ValidationError::SignatureMismatch`] from verification,
    /// [`ValidationError::Expired`], [`ValidationError::WrongKind`],
    /// [`ValidationError::Revoked`], or [`ValidationError::Backend`] when
    /// the denylist cannot be consulted.
    pub async fn validate(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> Result<Identity, ValidationError> {
        self.validate_at(token, expected, Utc::now().timestamp())
            .await
    }

    /// Deterministic-clock variant of [`Self::validate`].
    ///
    /// Production code uses `validate`; this exists so expiry boundaries
    /// can be tested without wall-clock dependence.
    pub(crate) async fn validate_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: i64,
    ) -> Result<Identity, ValidationError> {
        let claims = self.authority.verify(token)?;

        if claims.exp <= now {
            tracing::debug!(
                target: "common.validator",
                kind = %claims.kind,
                "Rejecting expired token"
            );
            return Err(ValidationError::Expired);
        }

        if claims.kind != expected {
            tracing::debug!(
                target: "common.validator",
                expected = %expected,
                actual = %claims.kind,
                "Rejecting token of wrong kind"
            );
            return Err(ValidationError::WrongKind);
        }

        match self.revocations.is_revoked(token).await {
            Ok(true) => {
                tracing::debug!(target: "common.validator", "Rejecting revoked token");
                Err(ValidationError::Revoked)
            }
            Ok(false) => Ok(claims.identity()),
            Err(e) => {
                tracing::error!(
                    target: "common.validator",
                    error = %e,
                    "Revocation check failed; rejecting token"
                );
                Err(ValidationError::Backend)
            }
        }
    }
}
