//! Token fixtures for integration tests.
//!
//! All fixtures sign with [`TEST_SIGNING_SECRET`], the same secret the
//! server harness configures, so tokens minted here verify against a
//! harness-spawned server.

use chrono::Utc;
use common::claims::{Claims, TokenKind};
use common::secret::SecretString;
use common::signing::SigningAuthority;
use common::types::{Identity, SubjectId};

/// Signing secret shared by the harness and the token fixtures.
pub const TEST_SIGNING_SECRET: &str = "integration-test-signing-secret-0123456789";

/// An authority over [`TEST_SIGNING_SECRET`].
pub fn test_authority() -> SigningAuthority {
    SigningAuthority::new(&SecretString::from(TEST_SIGNING_SECRET))
}

/// Sign a token with explicit claims.
///
/// # Example
/// ```rust,ignore
/// let now = chrono::Utc::now().timestamp();
/// let token = token_with(7, "alice", TokenKind::Access, now, now + 3600);
/// ```
pub fn token_with(subject_id: u64, name: &str, kind: TokenKind, iat: i64, exp: i64) -> String {
    let identity = Identity::new(SubjectId(subject_id), name);
    let claims = Claims::new(&identity, kind, iat, exp);
    test_authority()
        .sign(&claims)
        .expect("signing with a fixed secret cannot fail")
}

/// An access token that expired an hour ago.
pub fn expired_access_token(subject_id: u64, name: &str) -> String {
    let now = Utc::now().timestamp();
    token_with(subject_id, name, TokenKind::Access, now - 7_200, now - 3_600)
}

/// A well-formed access token signed with a different secret.
///
/// Useful for testing signature rejection.
pub fn foreign_signed_token(subject_id: u64, name: &str) -> String {
    let authority = SigningAuthority::new(&SecretString::from(
        "some-other-deployments-secret-9876543210",
    ));
    let identity = Identity::new(SubjectId(subject_id), name);
    let now = Utc::now().timestamp();
    let claims = Claims::new(&identity, TokenKind::Access, now, now + 3_600);
    authority
        .sign(&claims)
        .expect("signing with a fixed secret cannot fail")
}
