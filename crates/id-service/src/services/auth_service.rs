//! Authentication orchestration.
//!
//! [`AuthService`] wires the account store, the token contract from
//! `common` (issuer, validator, revocation denylist, session cache), the
//! verification code service and the audit sink into the five account
//! operations: register, login, logout, refresh and password change.
//!
//! Failure handling is deliberately asymmetric. The session cache is an
//! optimization, so populating it is best effort; invalidating it is not,
//! because acknowledging a logout or password change while a stale
//! snapshot survives would be a lie. The audit sink never vetoes an
//! operation that already succeeded.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::claims::TokenKind;
use common::issuer::{TokenIssuer, TokenTtls};
use common::signing::SigningAuthority;
use common::store::{RevocationStore, SessionCache, TtlStore};
use common::types::SubjectId;
use common::validator::TokenValidator;

use crate::crypto;
use crate::errors::IdError;
use crate::models::{LoginResponse, NewUser, RefreshResponse, RegisterRequest, UserRecord};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{
    record_audit_failure, record_revocation, record_session_cache, record_token_issued,
};
use crate::repositories::{AuditEvent, AuditKind, AuditLog, UserStore};
use crate::services::verification_service::VerificationService;

// ===== Account policy =====

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;
/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 20;
/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;
/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Password policy: 6 to 20 characters with at least one ASCII letter and
/// one ASCII digit.
fn password_meets_policy(password: &str) -> bool {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return false;
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    has_letter && has_digit
}

/// Username policy: 3 to 32 characters, ASCII alphanumeric plus `.`, `_`
/// and `-`, starting with an alphanumeric.
///
/// The username is propagated in an HTTP header at the edge, so every
/// accepted character must be header-safe.
fn username_meets_policy(username: &str) -> bool {
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&username.len()) {
        return false;
    }
    let mut chars = username.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphanumeric() {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

/// Minimal structural check on an email address.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

// ===== Service =====

/// Orchestrates all account and token operations.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    audit: Arc<dyn AuditLog>,
    authority: SigningAuthority,
    issuer: TokenIssuer,
    validator: TokenValidator,
    revocations: RevocationStore,
    sessions: SessionCache,
    codes: VerificationService,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Assemble the service. All token machinery (issuer, validator,
    /// denylist, session cache, verification codes) is built over the one
    /// shared TTL store.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserStore>,
        audit: Arc<dyn AuditLog>,
        store: Arc<dyn TtlStore>,
        authority: SigningAuthority,
        ttls: TokenTtls,
        session_ttl: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        let revocations = RevocationStore::new(store.clone());
        Self {
            issuer: TokenIssuer::new(authority.clone(), ttls),
            validator: TokenValidator::new(authority.clone(), revocations.clone()),
            sessions: SessionCache::with_ttl(store.clone(), session_ttl),
            codes: VerificationService::new(store),
            authority,
            users,
            audit,
            revocations,
            bcrypt_cost,
        }
    }

    /// A validator sharing this service's signing authority and denylist,
    /// for wiring into request middleware.
    #[must_use]
    pub fn validator(&self) -> TokenValidator {
        self.validator.clone()
    }

    /// Create an account.
    ///
    /// The verification code is checked before anything is written, and
    /// uniqueness is left entirely to the user store's constraint so
    /// concurrent registrations cannot both succeed.
    ///
    /// # Errors
    ///
    /// [`IdError::WeakCredential`] for policy violations,
    /// [`IdError::InvalidProof`] for a bad verification code and
    /// [`IdError::DuplicateAccount`] when the username or email is taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserRecord, IdError> {
        if !username_meets_policy(&request.username)
            || !password_meets_policy(&request.password)
            || !is_valid_email(&request.email)
        {
            return Err(IdError::WeakCredential);
        }

        // Proof of control over the email comes before any write.
        self.codes.check(&request.email, &request.code).await?;

        let password_hash = crypto::hash_password(&request.password, self.bcrypt_cost)?;
        let record = self
            .users
            .create(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
            })
            .await?;

        tracing::info!(
            target: "id.auth",
            subject_id = record.subject_id.0,
            "Account registered"
        );
        self.audit_best_effort(AuditEvent::new(
            AuditKind::Registered,
            Some(record.subject_id),
            hash_for_correlation(&record.username),
        ))
        .await;
        Ok(record)
    }

    /// Authenticate and mint an access/refresh token pair.
    ///
    /// # Errors
    ///
    /// [`IdError::AccountNotFound`], [`IdError::BadCredential`] and
    /// [`IdError::Disabled`]. The first two collapse into one response at
    /// the HTTP boundary.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, IdError> {
        let user = self.users.find_by_username(username).await?;

        // Always run the verification against some digest so an unknown
        // account costs the same as a wrong password.
        let digest = user
            .as_ref()
            .map_or(crypto::DUMMY_PASSWORD_HASH, |u| u.password_hash.as_str());
        let password_ok = crypto::verify_password(password, digest)?;

        let Some(user) = user else {
            self.record_login_failure(username, None).await;
            return Err(IdError::AccountNotFound);
        };
        if !password_ok {
            self.record_login_failure(username, Some(user.subject_id)).await;
            return Err(IdError::BadCredential);
        }
        if !user.status.is_active() {
            self.record_login_failure(username, Some(user.subject_id)).await;
            return Err(IdError::Disabled);
        }

        let identity = user.identity();
        let access_token = self.issuer.issue_access(&identity)?;
        let refresh_token = self.issuer.issue_refresh(&identity)?;
        record_token_issued(TokenKind::Access.as_str());
        record_token_issued(TokenKind::Refresh.as_str());

        // Best effort: a cold cache only costs a later lookup.
        if let Err(e) = self
            .sessions
            .put(identity.subject_id, &access_token, &user.profile())
            .await
        {
            tracing::warn!(target: "id.auth", error = %e, "Failed to populate session cache");
            record_session_cache("put", "error");
        } else {
            record_session_cache("put", "success");
        }

        tracing::info!(
            target: "id.auth",
            subject_id = identity.subject_id.0,
            "Login succeeded"
        );
        self.audit_best_effort(AuditEvent::new(
            AuditKind::LoginSucceeded,
            Some(identity.subject_id),
            hash_for_correlation(username),
        ))
        .await;

        Ok(LoginResponse {
            subject_id: identity.subject_id,
            subject_name: identity.subject_name,
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.issuer.ttl_for(TokenKind::Access).as_secs(),
        })
    }

    /// Log out: revoke the presented token for its remaining lifetime and
    /// drop the subject's cached session.
    ///
    /// Idempotent by construction. Revoking an already-revoked token
    /// changes nothing, and a token past its expiry skips the denylist
    /// write entirely; both acknowledge. Only a token that never verified
    /// (garbage, foreign signature) is rejected, because it names no
    /// subject to log out.
    ///
    /// # Errors
    ///
    /// [`IdError::InvalidToken`] for an unverifiable token and
    /// [`IdError::Store`] when the denylist write or the session
    /// invalidation fails; neither may be silently skipped.
    pub async fn logout(&self, token: &str) -> Result<(), IdError> {
        let claims = match self.authority.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(target: "id.auth", "Logout token did not verify");
                return Err(e.into());
            }
        };

        let remaining = claims.remaining_lifetime(Utc::now().timestamp());
        if let Err(e) = self.revocations.revoke(token, remaining).await {
            record_revocation("error");
            return Err(e.into());
        }
        record_revocation("success");

        let subject_id = SubjectId(claims.sub);
        if let Err(e) = self.sessions.invalidate(subject_id).await {
            record_session_cache("invalidate", "error");
            return Err(e.into());
        }
        record_session_cache("invalidate", "success");

        tracing::info!(target: "id.auth", subject_id = claims.sub, "Logged out");
        self.audit_best_effort(AuditEvent::new(
            AuditKind::LoggedOut,
            Some(subject_id),
            hash_for_correlation(&claims.name),
        ))
        .await;
        Ok(())
    }

    /// Mint a replacement access token from a live refresh token.
    ///
    /// The account is re-read from the user store, never from the session
    /// cache, so a disable that happened after the refresh token was
    /// minted is honored.
    ///
    /// # Errors
    ///
    /// Token failures map per [`IdError::from`]; a missing or disabled
    /// account produces [`IdError::Disabled`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, IdError> {
        let identity = self
            .validator
            .validate(refresh_token, TokenKind::Refresh)
            .await?;

        let user = self
            .users
            .find_by_id(identity.subject_id)
            .await?
            .ok_or(IdError::Disabled)?;
        if !user.status.is_active() {
            tracing::info!(
                target: "id.auth",
                subject_id = user.subject_id.0,
                "Refresh rejected for disabled account"
            );
            return Err(IdError::Disabled);
        }

        let access_token = self.issuer.issue_access(&user.identity())?;
        record_token_issued(TokenKind::Access.as_str());

        if let Err(e) = self
            .sessions
            .put(user.subject_id, &access_token, &user.profile())
            .await
        {
            tracing::warn!(target: "id.auth", error = %e, "Failed to refresh session cache");
            record_session_cache("put", "error");
        } else {
            record_session_cache("put", "success");
        }

        self.audit_best_effort(AuditEvent::new(
            AuditKind::TokenRefreshed,
            Some(user.subject_id),
            hash_for_correlation(&user.username),
        ))
        .await;

        Ok(RefreshResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.issuer.ttl_for(TokenKind::Access).as_secs(),
        })
    }

    /// Change the password, then synchronously drop the cached session.
    ///
    /// Existing tokens stay valid; a password change is not a revocation.
    ///
    /// # Errors
    ///
    /// [`IdError::BadCredential`] when the old password does not match
    /// and [`IdError::WeakCredential`] when the new one fails policy.
    pub async fn change_password(
        &self,
        subject_id: SubjectId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), IdError> {
        let user = self
            .users
            .find_by_id(subject_id)
            .await?
            .ok_or(IdError::AccountNotFound)?;

        if !crypto::verify_password(old_password, &user.password_hash)? {
            tracing::info!(
                target: "id.auth",
                subject_id = subject_id.0,
                "Password change rejected"
            );
            return Err(IdError::BadCredential);
        }
        if !password_meets_policy(new_password) {
            return Err(IdError::WeakCredential);
        }

        let password_hash = crypto::hash_password(new_password, self.bcrypt_cost)?;
        self.users.update_password(subject_id, &password_hash).await?;

        // Synchronous: the stale snapshot must be gone before the change
        // is acknowledged.
        if let Err(e) = self.sessions.invalidate(subject_id).await {
            record_session_cache("invalidate", "error");
            return Err(e.into());
        }
        record_session_cache("invalidate", "success");

        self.audit_best_effort(AuditEvent::new(
            AuditKind::PasswordChanged,
            Some(subject_id),
            hash_for_correlation(&user.username),
        ))
        .await;
        Ok(())
    }

    /// Issue a verification code for a registration target.
    ///
    /// # Errors
    ///
    /// [`IdError::InvalidTarget`] for an unusable address and
    /// [`IdError::RateLimited`] inside the re-send window.
    pub async fn request_code(&self, target: &str) -> Result<(), IdError> {
        if !is_valid_email(target) {
            return Err(IdError::InvalidTarget);
        }
        // The code goes to a delivery channel at the deployment boundary;
        // nothing else ever sees it.
        self.codes.issue(target).await?;
        Ok(())
    }

    async fn record_login_failure(&self, username: &str, subject_id: Option<SubjectId>) {
        tracing::info!(
            target: "id.auth",
            username_hash = %hash_for_correlation(username),
            "Login failed"
        );
        self.audit_best_effort(AuditEvent::new(
            AuditKind::LoginFailed,
            subject_id,
            hash_for_correlation(username),
        ))
        .await;
    }

    /// Record an audit event; failures are logged and counted, never
    /// propagated.
    async fn audit_best_effort(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(event).await {
            tracing::warn!(target: "id.auth", error = %e, "Failed to record audit event");
            record_audit_failure();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::claims::Claims;
    use common::error::ValidationError;
    use common::secret::SecretString;
    use common::store::{FailingStore, MemoryStore};
    use common::types::Identity;
    use tokio::sync::Mutex;

    use crate::models::UserStatus;
    use crate::repositories::audit::AuditError;
    use crate::repositories::InMemoryUserStore;

    const TEST_SECRET: &str = "auth-service-test-secret-0123456789abcdef";
    // Minimum bcrypt cost keeps the tests quick.
    const TEST_COST: u32 = 4;

    // ---------- test doubles ----------

    #[derive(Default)]
    struct RecordingAuditLog {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditLog for RecordingAuditLog {
        async fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    struct FailingAuditLog;

    #[async_trait]
    impl AuditLog for FailingAuditLog {
        async fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
            Err(AuditError("sink offline".to_string()))
        }
    }

    // ---------- fixtures ----------

    struct Fixture {
        service: AuthService,
        users: Arc<InMemoryUserStore>,
        store: Arc<MemoryStore>,
        audit: Arc<RecordingAuditLog>,
    }

    fn authority() -> SigningAuthority {
        SigningAuthority::new(&SecretString::from(TEST_SECRET))
    }

    fn fixture() -> Fixture {
        let users = Arc::new(InMemoryUserStore::new());
        let store = Arc::new(MemoryStore::new());
        let audit = Arc::new(RecordingAuditLog::default());
        let service = AuthService::new(
            users.clone(),
            audit.clone(),
            store.clone(),
            authority(),
            TokenTtls::default(),
            Duration::from_secs(24 * 60 * 60),
            TEST_COST,
        );
        Fixture {
            service,
            users,
            store,
            audit,
        }
    }

    async fn register_user(fixture: &Fixture, username: &str, email: &str, password: &str) -> UserRecord {
        let code = fixture.service.codes.issue(email).await.unwrap();
        fixture
            .service
            .register(RegisterRequest {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                code,
            })
            .await
            .unwrap()
    }

    fn session_cache_over(store: Arc<MemoryStore>) -> SessionCache {
        SessionCache::new(store)
    }

    // ---------- policy checks ----------

    #[test]
    fn test_password_policy() {
        assert!(password_meets_policy("abc123"));
        assert!(password_meets_policy("correct-horse7"));
        assert!(password_meets_policy("a1b2c3d4e5f6g7h8i9j0"));

        assert!(!password_meets_policy("ab1"));
        assert!(!password_meets_policy("a1b2c3d4e5f6g7h8i9j0x"));
        assert!(!password_meets_policy("onlyletters"));
        assert!(!password_meets_policy("12345678"));
        assert!(!password_meets_policy(""));
    }

    #[test]
    fn test_username_policy() {
        assert!(username_meets_policy("ada"));
        assert!(username_meets_policy("ada.lovelace"));
        assert!(username_meets_policy("user_42-x"));

        assert!(!username_meets_policy("ab"));
        assert!(!username_meets_policy(&"a".repeat(33)));
        assert!(!username_meets_policy(".leading"));
        assert!(!username_meets_policy("has space"));
        assert!(!username_meets_policy("smuggle\r\nx-user-id"));
        assert!(!username_meets_policy("émile"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));

        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@"));
        assert!(!is_valid_email("ada@nodot"));
        assert!(!is_valid_email("ada@.leading.dot"));
        assert!(!is_valid_email("ada@trailing.dot."));
        assert!(!is_valid_email("ada@two@ats.com"));
    }

    // ---------- register ----------

    #[tokio::test]
    async fn test_register_then_login() {
        let fixture = fixture();

        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        assert_eq!(record.username, "ada");
        assert!(record.status.is_active());

        let login = fixture.service.login("ada", "pass1word").await.unwrap();
        assert_eq!(login.subject_id, record.subject_id);
        assert_eq!(login.subject_name, "ada");
        assert_eq!(login.token_type, "Bearer");
        assert_eq!(login.expires_in, 7_200);
        assert!(!login.access_token.is_empty());
        assert!(!login.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_policy_violations() {
        let fixture = fixture();
        let code = fixture.service.codes.issue("ada@example.com").await.unwrap();

        for (username, password) in [
            ("ada", "short"),
            ("ada", "allletters"),
            ("ada", "12345678"),
            ("ab", "pass1word"),
            ("bad name", "pass1word"),
        ] {
            let result = fixture
                .service
                .register(RegisterRequest {
                    username: username.to_string(),
                    email: "ada@example.com".to_string(),
                    password: password.to_string(),
                    code: code.clone(),
                })
                .await;
            assert!(matches!(result, Err(IdError::WeakCredential)));
        }
    }

    #[tokio::test]
    async fn test_register_requires_valid_proof() {
        let fixture = fixture();

        let result = fixture
            .service
            .register(RegisterRequest {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "pass1word".to_string(),
                code: "000000".to_string(),
            })
            .await;

        assert!(matches!(result, Err(IdError::InvalidProof)));
        // Nothing may be written when the proof fails.
        assert!(fixture
            .users
            .find_by_username("ada")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let fixture = fixture();
        register_user(&fixture, "ada", "ada@example.com", "pass1word").await;

        let code = fixture
            .service
            .codes
            .issue("other@example.com")
            .await
            .unwrap();
        let result = fixture
            .service
            .register(RegisterRequest {
                username: "ada".to_string(),
                email: "other@example.com".to_string(),
                password: "pass1word".to_string(),
                code,
            })
            .await;

        assert!(matches!(result, Err(IdError::DuplicateAccount)));
    }

    // ---------- login ----------

    #[tokio::test]
    async fn test_login_failures_are_typed() {
        let fixture = fixture();
        register_user(&fixture, "ada", "ada@example.com", "pass1word").await;

        let unknown = fixture.service.login("ghost", "pass1word").await;
        assert!(matches!(unknown, Err(IdError::AccountNotFound)));

        let wrong = fixture.service.login("ada", "wrong2pass").await;
        assert!(matches!(wrong, Err(IdError::BadCredential)));
    }

    #[tokio::test]
    async fn test_login_disabled_account_rejected() {
        let fixture = fixture();
        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        fixture
            .users
            .update_status(record.subject_id, UserStatus::Disabled)
            .await
            .unwrap();

        let result = fixture.service.login("ada", "pass1word").await;

        assert!(matches!(result, Err(IdError::Disabled)));
    }

    #[tokio::test]
    async fn test_login_populates_session_cache() {
        let fixture = fixture();
        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;

        let login = fixture.service.login("ada", "pass1word").await.unwrap();

        let entry = session_cache_over(fixture.store.clone())
            .get::<crate::models::ProfileSnapshot>(record.subject_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(entry.last_token, login.access_token);
        assert_eq!(entry.profile.username, "ada");
        assert_eq!(entry.profile.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_login_survives_audit_outage() {
        let users = Arc::new(InMemoryUserStore::new());
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::new(
            users,
            Arc::new(FailingAuditLog),
            store,
            authority(),
            TokenTtls::default(),
            Duration::from_secs(60),
            TEST_COST,
        );
        let code = service.codes.issue("ada@example.com").await.unwrap();
        service
            .register(RegisterRequest {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "pass1word".to_string(),
                code,
            })
            .await
            .unwrap();

        // The audit sink fails on every event; the login must not care.
        assert!(service.login("ada", "pass1word").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_survives_session_cache_outage() {
        let users = Arc::new(InMemoryUserStore::new());
        let service = AuthService::new(
            users.clone(),
            Arc::new(RecordingAuditLog::default()),
            Arc::new(MemoryStore::new()),
            authority(),
            TokenTtls::default(),
            Duration::from_secs(60),
            TEST_COST,
        );
        let code = service.codes.issue("ada@example.com").await.unwrap();
        service
            .register(RegisterRequest {
                username: "ada".to_string(),
                email: "ada@example.com".to_string(),
                password: "pass1word".to_string(),
                code,
            })
            .await
            .unwrap();

        // Same accounts, but every TTL store call now fails.
        let broken = AuthService::new(
            users,
            Arc::new(RecordingAuditLog::default()),
            Arc::new(FailingStore::backend()),
            authority(),
            TokenTtls::default(),
            Duration::from_secs(60),
            TEST_COST,
        );

        assert!(broken.login("ada", "pass1word").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_is_audited() {
        let fixture = fixture();
        register_user(&fixture, "ada", "ada@example.com", "pass1word").await;

        fixture.service.login("ada", "pass1word").await.unwrap();
        let _ = fixture.service.login("ada", "wrong2pass").await;

        let events = fixture.audit.events.lock().await;
        let kinds: Vec<AuditKind> = events.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&AuditKind::Registered));
        assert!(kinds.contains(&AuditKind::LoginSucceeded));
        assert!(kinds.contains(&AuditKind::LoginFailed));
        // Audit events carry correlation hashes, never the username.
        assert!(events.iter().all(|e| e.username_hash != "ada"));
    }

    // ---------- logout ----------

    #[tokio::test]
    async fn test_logout_revokes_token_and_clears_session() {
        let fixture = fixture();
        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        let login = fixture.service.login("ada", "pass1word").await.unwrap();

        fixture.service.logout(&login.access_token).await.unwrap();

        let validator = fixture.service.validator();
        let result = validator
            .validate(&login.access_token, TokenKind::Access)
            .await;
        assert_eq!(result, Err(ValidationError::Revoked));

        let entry = session_cache_over(fixture.store.clone())
            .get::<crate::models::ProfileSnapshot>(record.subject_id)
            .await
            .unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_logout_twice_is_ok() {
        let fixture = fixture();
        register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        let login = fixture.service.login("ada", "pass1word").await.unwrap();

        fixture.service.logout(&login.access_token).await.unwrap();
        fixture.service.logout(&login.access_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_logout_with_expired_token_is_ok() {
        let fixture = fixture();

        // Hand-build a token whose lifetime already lapsed.
        let identity = Identity::new(SubjectId(9), "ada");
        let claims = Claims::new(&identity, TokenKind::Access, 1_000, 2_000);
        let expired = authority().sign(&claims).unwrap();

        fixture.service.logout(&expired).await.unwrap();

        // No denylist entry for a token that is already dead.
        assert!(!fixture
            .store
            .exists(&format!("auth:revoked:{expired}"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_logout_with_garbage_token_rejected() {
        let fixture = fixture();

        let result = fixture.service.logout("not-a-token").await;

        assert!(matches!(result, Err(IdError::InvalidToken)));
    }

    // ---------- refresh ----------

    #[tokio::test]
    async fn test_refresh_mints_new_access_token() {
        let fixture = fixture();
        register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        let login = fixture.service.login("ada", "pass1word").await.unwrap();

        let refreshed = fixture.service.refresh(&login.refresh_token).await.unwrap();

        assert_eq!(refreshed.token_type, "Bearer");
        let validator = fixture.service.validator();
        let identity = validator
            .validate(&refreshed.access_token, TokenKind::Access)
            .await
            .unwrap();
        assert_eq!(identity.subject_name, "ada");
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let fixture = fixture();
        register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        let login = fixture.service.login("ada", "pass1word").await.unwrap();

        let result = fixture.service.refresh(&login.access_token).await;

        assert!(matches!(result, Err(IdError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_checks_live_status_not_cache() {
        let fixture = fixture();
        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        let login = fixture.service.login("ada", "pass1word").await.unwrap();

        // The session cache still holds an active snapshot; the account
        // store says disabled. The store must win.
        fixture
            .users
            .update_status(record.subject_id, UserStatus::Disabled)
            .await
            .unwrap();

        let result = fixture.service.refresh(&login.refresh_token).await;

        assert!(matches!(result, Err(IdError::Disabled)));
    }

    #[tokio::test]
    async fn test_refresh_token_survives_access_logout() {
        let fixture = fixture();
        register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        let login = fixture.service.login("ada", "pass1word").await.unwrap();

        fixture.service.logout(&login.access_token).await.unwrap();

        // Revocation names exactly one token; the refresh token is not
        // swept up with the access token.
        assert!(fixture.service.refresh(&login.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_fails_closed_on_store_outage() {
        let service = AuthService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(RecordingAuditLog::default()),
            Arc::new(FailingStore::timeout()),
            authority(),
            TokenTtls::default(),
            Duration::from_secs(60),
            TEST_COST,
        );
        let identity = Identity::new(SubjectId(1), "ada");
        let now = Utc::now().timestamp();
        let claims = Claims::new(&identity, TokenKind::Refresh, now, now + 3_600);
        let token = authority().sign(&claims).unwrap();

        let result = service.refresh(&token).await;

        // The revocation check could not run, so the token is rejected.
        assert!(matches!(result, Err(IdError::InvalidToken)));
    }

    // ---------- change password ----------

    #[tokio::test]
    async fn test_change_password_flow() {
        let fixture = fixture();
        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        fixture.service.login("ada", "pass1word").await.unwrap();

        fixture
            .service
            .change_password(record.subject_id, "pass1word", "new2password")
            .await
            .unwrap();

        // Old password is dead, new one works.
        assert!(matches!(
            fixture.service.login("ada", "pass1word").await,
            Err(IdError::BadCredential)
        ));
        assert!(fixture.service.login("ada", "new2password").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_invalidates_session() {
        let fixture = fixture();
        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;
        fixture.service.login("ada", "pass1word").await.unwrap();

        fixture
            .service
            .change_password(record.subject_id, "pass1word", "new2password")
            .await
            .unwrap();

        let entry = session_cache_over(fixture.store.clone())
            .get::<crate::models::ProfileSnapshot>(record.subject_id)
            .await
            .unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_change_password_rejects_wrong_old_and_weak_new() {
        let fixture = fixture();
        let record = register_user(&fixture, "ada", "ada@example.com", "pass1word").await;

        let wrong_old = fixture
            .service
            .change_password(record.subject_id, "wrong2pass", "new2password")
            .await;
        assert!(matches!(wrong_old, Err(IdError::BadCredential)));

        let weak_new = fixture
            .service
            .change_password(record.subject_id, "pass1word", "weak")
            .await;
        assert!(matches!(weak_new, Err(IdError::WeakCredential)));

        // Neither attempt may have touched the stored digest.
        assert!(fixture.service.login("ada", "pass1word").await.is_ok());
    }

    // ---------- verification codes ----------

    #[tokio::test]
    async fn test_request_code_validates_target() {
        let fixture = fixture();

        let result = fixture.service.request_code("not-an-email").await;

        assert!(matches!(result, Err(IdError::InvalidTarget)));
    }

    #[tokio::test]
    async fn test_request_code_rate_limited_on_resend() {
        let fixture = fixture();

        fixture
            .service
            .request_code("ada@example.com")
            .await
            .unwrap();
        let second = fixture.service.request_code("ada@example.com").await;

        assert!(matches!(second, Err(IdError::RateLimited)));
    }
}
