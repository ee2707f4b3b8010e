//! Token issuance.
//!
//! The issuer is the only place tokens are minted. It owns the lifetime
//! policy (short access tokens, long refresh tokens) and stamps `iat` from
//! the clock at call time, so `exp > iat` holds for every token ever
//! produced.

use crate::claims::{Claims, TokenKind};
use crate::error::SigningError;
use crate::signing::SigningAuthority;
use crate::types::Identity;
use chrono::Utc;
use std::time::Duration;

// ===== Constants =====

/// Default access-token lifetime: two hours.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// Default refresh-token lifetime: seven days.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Access and refresh lifetimes an issuer mints with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtls {
    /// Access-token lifetime.
    pub access: Duration,
    /// Refresh-token lifetime.
    pub refresh: Duration,
}

impl Default for TokenTtls {
    fn default() -> Self {
        Self {
            access: DEFAULT_ACCESS_TTL,
            refresh: DEFAULT_REFRESH_TTL,
        }
    }
}

/// Mints signed access and refresh tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    authority: SigningAuthority,
    ttls: TokenTtls,
}

impl TokenIssuer {
    /// Build an issuer over `authority` with the given lifetimes.
    #[must_use]
    pub fn new(authority: SigningAuthority, ttls: TokenTtls) -> Self {
        Self { authority, ttls }
    }

    /// Mint an access token for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if signing fails.
    pub fn issue_access(&self, identity: &Identity) -> Result<String, SigningError> {
        self.issue_at(identity, TokenKind::Access, Utc::now().timestamp())
    }

    /// Mint a refresh token for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if signing fails.
    pub fn issue_refresh(&self, identity: &Identity) -> Result<String, SigningError> {
        self.issue_at(identity, TokenKind::Refresh, Utc::now().timestamp())
    }

    /// Lifetime tokens of `kind` are minted with.
    #[must_use]
    pub fn ttl_for(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.ttls.access,
            TokenKind::Refresh => self.ttls.refresh,
        }
    }

    /// Deterministic issuance used by expiry boundary tests.
    ///
    /// Production code goes through [`Self::issue_access`] and
    /// [`Self::issue_refresh`], which stamp the wall clock.
    pub(crate) fn issue_at(
        &self,
        identity: &Identity,
        kind: TokenKind,
        now: i64,
    ) -> Result<String, SigningError> {
        // Safe cast: configured lifetimes are far below i64::MAX seconds.
        #[allow(clippy::cast_possible_wrap)]
        let ttl = self.ttl_for(kind).as_secs() as i64;
        let claims = Claims::new(identity, kind, now, now + ttl);
        self.authority.sign(&claims)
    }
}
