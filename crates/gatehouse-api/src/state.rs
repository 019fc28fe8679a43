//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{Argon2Hasher, AuthService, PasswordConfig, PasswordError, TokenIssuer};
use gatehouse_core::{AppConfig, UserStore};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Credential store
    pub store: Arc<dyn UserStore>,
    /// Token issuer/verifier
    pub tokens: TokenIssuer,
    /// Register/login orchestration
    pub auth: AuthService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Wire the auth components around an already connected store
    pub fn new(config: AppConfig, store: Arc<dyn UserStore>) -> Result<Self, PasswordError> {
        let hasher = Argon2Hasher::new(&PasswordConfig::from(&config.auth))?;
        let tokens = TokenIssuer::from_config(&config.auth);
        let auth = AuthService::new(store.clone(), hasher, tokens.clone())?;

        Ok(Self {
            config,
            store,
            tokens,
            auth,
            start_time: Instant::now(),
        })
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
