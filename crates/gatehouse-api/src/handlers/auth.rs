//! Authentication API handlers
//!
//! Author: hephaex@gmail.com

use super::ApiJson;
use crate::auth::{AuthenticatedUser, LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use gatehouse_core::{Role, User, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const SUCCESS: &str = "success";

/// Full user summary, never including the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
        }
    }
}

impl From<AuthenticatedUser> for UserSummary {
    fn from(user: AuthenticatedUser) -> Self {
        Self {
            id: user.user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
        }
    }
}

/// User summary returned by login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<User> for LoginUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryData {
    pub user: UserSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginData {
    pub user: LoginUser,
}

/// Registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub status: String,
    pub token: String,
    pub data: SummaryData,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub status: String,
    pub token: String,
    pub data: LoginData,
}

/// Current user response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub status: String,
    pub data: SummaryData,
}

/// Register a new user account
///
/// Creates a user and returns a token for it. Role defaults to "user".
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = RegisterResponse),
        (status = 400, description = "Missing or invalid fields", body = crate::error::ApiError),
        (status = 409, description = "Email already registered", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.auth.register(request).await?;

    let response = RegisterResponse {
        status: SUCCESS.to_string(),
        token: outcome.token,
        data: SummaryData {
            user: outcome.user.into(),
        },
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
///
/// Unknown email and wrong password produce the same 401 response.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields", body = crate::error::ApiError),
        (status = 401, description = "Incorrect email or password", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.auth.login(request).await?;

    Ok(Json(LoginResponse {
        status: SUCCESS.to_string(),
        token: outcome.token,
        data: LoginData {
            user: outcome.user.into(),
        },
    }))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = MeResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
    Json(MeResponse {
        status: SUCCESS.to_string(),
        data: SummaryData { user: user.into() },
    })
}
