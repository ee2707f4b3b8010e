//! Token claims model.
//!
//! One claims shape for the whole platform. Tokens are compact JWTs whose
//! payload is exactly [`Claims`]; the issuer writes it and the validator
//! reads it back, so there is no second definition anywhere to drift.

use crate::types::{Identity, SubjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminates short-lived access tokens from long-lived refresh tokens.
///
/// The kind is baked into the token at issuance; validators enforce it
/// against the kind the call site expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Grants access to protected resources. Short lifetime.
    Access,
    /// Mints replacement access tokens. Long lifetime.
    Refresh,
}

impl TokenKind {
    /// Stable wire name of the kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT payload carried by every Gatehouse token.
///
/// Invariant: `exp` is strictly greater than `iat` for every token ever
/// minted; the issuer derives `exp` from `iat` plus a positive lifetime.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id of the account the token was minted for.
    pub sub: u64,
    /// Subject display name at issuance time.
    pub name: String,
    /// Access or refresh.
    pub kind: TokenKind,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Build claims for `identity`.
    #[must_use]
    pub fn new(identity: &Identity, kind: TokenKind, iat: i64, exp: i64) -> Self {
        Self {
            sub: identity.subject_id.0,
            name: identity.subject_name.clone(),
            kind,
            iat,
            exp,
        }
    }

    /// The identity this token was minted for.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(SubjectId(self.sub), self.name.clone())
    }

    /// Seconds of lifetime left at `now`; zero or negative once expired.
    #[must_use]
    pub fn remaining_lifetime(&self, now: i64) -> i64 {
        self.exp - now
    }
}

// Same redaction rule as Identity: display names stay out of logs.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &self.sub)
            .field("name", &"[REDACTED]")
            .field("kind", &self.kind)
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new(SubjectId(42), "carol")
    }

    // ---------- TokenKind ----------

    #[test]
    fn test_kind_serializes_to_lowercase_strings() {
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenKind::Refresh).unwrap(), "\"refresh\"");
    }

    #[test]
    fn test_kind_round_trips_through_serde() {
        let kind: TokenKind = serde_json::from_str("\"refresh\"").unwrap();
        assert_eq!(kind, TokenKind::Refresh);
    }

    #[test]
    fn test_kind_display_matches_as_str() {
        assert_eq!(TokenKind::Access.to_string(), "access");
        assert_eq!(TokenKind::Refresh.to_string(), "refresh");
    }

    // ---------- Claims ----------

    #[test]
    fn test_claims_identity_round_trip() {
        let claims = Claims::new(&identity(), TokenKind::Access, 1_000, 8_200);
        assert_eq!(claims.identity(), identity());
        assert_eq!(claims.sub, 42);
    }

    #[test]
    fn test_remaining_lifetime_counts_down_and_goes_negative() {
        let claims = Claims::new(&identity(), TokenKind::Access, 1_000, 8_200);
        assert_eq!(claims.remaining_lifetime(1_000), 7_200);
        assert_eq!(claims.remaining_lifetime(8_200), 0);
        assert_eq!(claims.remaining_lifetime(8_201), -1);
    }

    #[test]
    fn test_claims_debug_redacts_name() {
        let claims = Claims::new(&identity(), TokenKind::Refresh, 1, 2);
        let rendered = format!("{claims:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("carol"));
    }

    #[test]
    fn test_claims_payload_shape() {
        let claims = Claims::new(&identity(), TokenKind::Access, 5, 10);
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["sub"], 42);
        assert_eq!(value["kind"], "access");
        assert_eq!(value["iat"], 5);
        assert_eq!(value["exp"], 10);
    }
}
