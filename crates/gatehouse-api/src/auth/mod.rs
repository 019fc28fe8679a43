//! Authentication and authorization module
//!
//! This module provides JWT-based authentication with the following components:
//! - Token issuance and verification
//! - Password hashing with Argon2
//! - Middleware for route protection and role gating
//! - Authentication service for registration and login

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{Claims, TokenError, TokenIssuer};
pub use middleware::{
    require_auth, restrict_to, AuthenticatedUser, FORBIDDEN, INVALID_TOKEN, NOT_AUTHORIZED,
    USER_GONE,
};
pub use password::{Argon2Hasher, PasswordConfig, PasswordError};
pub use service::{
    AuthOutcome, AuthService, LoginRequest, RegisterRequest, DUPLICATE_EMAIL, INVALID_CREDENTIALS,
};
