//! Account storage capability.
//!
//! The [`UserStore`] trait is the seam between the authentication logic
//! and whatever holds the accounts. The bundled [`InMemoryUserStore`]
//! backs local development and the test harness; a database-backed
//! implementation slots in behind the same trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::types::SubjectId;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{NewUser, UserRecord, UserStatus};

/// Account storage errors.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// The uniqueness constraint on username or email was violated.
    #[error("account already exists")]
    Duplicate,

    /// No account matches the given identifier.
    #[error("account not found")]
    NotFound,

    /// The backing store failed.
    #[error("user store error: {0}")]
    Backend(String),
}

/// Account storage operations.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create an account.
    ///
    /// Uniqueness of username and email is enforced here, atomically with
    /// the insert. Callers must not pre-check and must treat
    /// [`UserStoreError::Duplicate`] as the one source of truth, so two
    /// concurrent registrations can never both succeed.
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, UserStoreError>;

    /// Look up an account by login name.
    async fn find_by_username(&self, username: &str)
        -> Result<Option<UserRecord>, UserStoreError>;

    /// Look up an account by identifier.
    async fn find_by_id(&self, id: SubjectId) -> Result<Option<UserRecord>, UserStoreError>;

    /// Replace the stored password digest.
    async fn update_password(
        &self,
        id: SubjectId,
        password_hash: &str,
    ) -> Result<(), UserStoreError>;

    /// Change the lifecycle status.
    async fn update_status(&self, id: SubjectId, status: UserStatus)
        -> Result<(), UserStoreError>;
}

/// Process-local account store.
///
/// All mutations take the single write lock, so concurrent creates race
/// exactly like rows hitting a database unique constraint: one insert
/// wins, every other sees [`UserStoreError::Duplicate`].
pub struct InMemoryUserStore {
    next_id: AtomicU64,
    accounts: RwLock<HashMap<u64, UserRecord>>,
}

impl InMemoryUserStore {
    /// Create an empty store. Identifiers start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            accounts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, UserStoreError> {
        let mut accounts = self.accounts.write().await;

        // Uniqueness check and insert under one lock.
        let clash = accounts
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email);
        if clash {
            return Err(UserStoreError::Duplicate);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = UserRecord {
            subject_id: SubjectId(id),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            status: UserStatus::Active,
            created_at: Utc::now(),
        };
        accounts.insert(id, record.clone());
        Ok(record)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: SubjectId) -> Result<Option<UserRecord>, UserStoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id.0).cloned())
    }

    async fn update_password(
        &self,
        id: SubjectId,
        password_hash: &str,
    ) -> Result<(), UserStoreError> {
        let mut accounts = self.accounts.write().await;
        let record = accounts.get_mut(&id.0).ok_or(UserStoreError::NotFound)?;
        record.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn update_status(
        &self,
        id: SubjectId,
        status: UserStatus,
    ) -> Result<(), UserStoreError> {
        let mut accounts = self.accounts.write().await;
        let record = accounts.get_mut(&id.0).ok_or(UserStoreError::NotFound)?;
        record.status = status;
        Ok(())
    }
}
