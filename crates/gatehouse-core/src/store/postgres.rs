//! PostgreSQL credential store
//!
//! Email uniqueness is enforced by the `users_email_key` constraint; a
//! violation surfaces as [`StoreError::DuplicateEmail`]. Every call is bounded
//! by the configured timeout.

use super::{StoreError, UserStore};
use crate::config::DatabaseConfig;
use crate::models::{NewUser, Role, User, UserCredentials, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

/// PostgreSQL user store
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    /// Connect to PostgreSQL using the database configuration
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(timeout)
            .connect(url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool, timeout })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))
    }

    async fn bounded<T, F>(&self, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::DuplicateEmail,
        sqlx::Error::PoolTimedOut => StoreError::Database("connection pool timed out".to_string()),
        _ => StoreError::Database(err.to_string()),
    }
}

/// User row without credentials
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::CorruptRecord(format!("user {}: {e}", row.id)))?;

        Ok(User {
            id: UserId::from(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            role,
            created_at: row.created_at,
        })
    }
}

/// User row including the password hash
#[derive(FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, role, created_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, new_user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, role, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
             RETURNING {USER_COLUMNS}"
        );

        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&query)
                    .bind(Uuid::new_v4())
                    .bind(&new_user.first_name)
                    .bind(&new_user.last_name)
                    .bind(&new_user.email)
                    .bind(&new_user.password_hash)
                    .bind(new_user.role.as_str())
                    .fetch_one(&self.pool),
            )
            .await?;

        row.try_into()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&query)
                    .bind(email)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");

        let row = self
            .bounded(
                sqlx::query_as::<_, CredentialRow>(&query)
                    .bind(email)
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(|r| {
            Ok(UserCredentials {
                user: User::try_from(r.user)?,
                password_hash: r.password_hash,
            })
        })
        .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let row = self
            .bounded(
                sqlx::query_as::<_, UserRow>(&query)
                    .bind(id.as_uuid())
                    .fetch_optional(&self.pool),
            )
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }
}
