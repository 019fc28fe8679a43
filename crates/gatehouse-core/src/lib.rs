//! Gatehouse Core - Domain models, configuration and credential storage
//!
//! This crate defines the pieces shared by the server and the session client:
//! - User account models and roles
//! - Role-based access policy
//! - Credential store trait with PostgreSQL and in-memory backends
//! - Configuration management

pub mod config;
pub mod models;
pub mod policy;
pub mod store;

pub use config::{
    AppConfig, AuthConfig, ConfigError, DatabaseConfig, Environment, LoggingConfig, ServerConfig,
};
pub use models::{normalize_email, NewUser, Role, UnknownRole, User, UserCredentials, UserId};
pub use policy::allowed;
pub use store::{MemoryUserStore, PgUserStore, StoreError, UserStore};
