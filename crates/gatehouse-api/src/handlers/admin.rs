//! Admin-only handlers
//!
//! Author: hephaex@gmail.com

use crate::auth::AuthenticatedUser;
use axum::{response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Admin ping response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminPingResponse {
    pub status: String,
    pub message: String,
}

/// Confirm the caller holds the admin role
#[utoipa::path(
    get,
    path = "/api/admin/ping",
    tag = "admin",
    responses(
        (status = 200, description = "Caller is an admin", body = AdminPingResponse),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ApiError),
        (status = 403, description = "Role not permitted", body = crate::error::ApiError),
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn ping_handler(Extension(user): Extension<AuthenticatedUser>) -> impl IntoResponse {
    Json(AdminPingResponse {
        status: "success".to_string(),
        message: format!("Hello, admin {}", user.user_id),
    })
}
