//! Credential store
//!
//! Persists user accounts addressed by their unique email. Email uniqueness
//! is a property of the store itself: of any number of concurrent inserts
//! with the same email, exactly one succeeds and the rest fail with
//! [`StoreError::DuplicateEmail`].

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::models::{NewUser, User, UserCredentials, UserId};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Credential store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already exists")]
    DuplicateEmail,

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt user record: {0}")]
    CorruptRecord(String),
}

/// Persistence boundary for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user, assigning its identifier
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Look up a user by normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Look up a user together with its password hash
    ///
    /// This is the only read that exposes the hash; it exists for login.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError>;

    /// Look up a user by identifier
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Check that the store is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}
