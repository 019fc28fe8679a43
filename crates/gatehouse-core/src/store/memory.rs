//! In-process credential store
//!
//! Used when no database URL is configured and throughout the test suites.

use super::{StoreError, UserStore};
use crate::models::{NewUser, User, UserCredentials, UserId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Records {
    by_id: HashMap<UserId, UserCredentials>,
    by_email: HashMap<String, UserId>,
}

/// In-memory user store
#[derive(Default)]
pub struct MemoryUserStore {
    records: RwLock<Records>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.records.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        // Check and insert under one write guard so duplicates cannot race
        let mut records = self.records.write().await;
        if records.by_email.contains_key(&new_user.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let user = User {
            id: UserId::new(),
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            email: new_user.email,
            role: new_user.role,
            created_at: Utc::now(),
        };

        records.by_email.insert(user.email.clone(), user.id);
        records.by_id.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .find_credentials_by_email(email)
            .await?
            .map(|credentials| credentials.user))
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .by_email
            .get(email)
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let records = self.records.read().await;
        Ok(records.by_id.get(&id).map(|c| c.user.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
