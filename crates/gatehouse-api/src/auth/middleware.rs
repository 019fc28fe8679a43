/// Route protection middleware
///
/// Extracts and verifies the bearer token from the Authorization header,
/// resolves its user against the credential store and adds the resulting
/// [`AuthenticatedUser`] to request extensions. Every token failure is
/// reported with the same message; the precise reason is only logged.
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use gatehouse_core::{allowed, Role, User, UserId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const NOT_AUTHORIZED: &str = "Not authorized to access this route";
pub const INVALID_TOKEN: &str = "Token is invalid or has expired";
pub const USER_GONE: &str = "User no longer exists";
pub const FORBIDDEN: &str = "You do not have permission to perform this action";

/// Authenticated user resolved from the bearer token
///
/// Extract in handlers with `Extension<AuthenticatedUser>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<User> for AuthenticatedUser {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Token after the "Bearer " prefix, if the header carries one
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that requires a valid bearer token
///
/// ```ignore
/// let protected = Router::new()
///     .route("/auth/me", get(me_handler))
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        tracing::info!(reason = e.reason(), outcome = "token_rejected", "Bearer token rejected");
        AppError::Unauthorized(INVALID_TOKEN.to_string())
    })?;

    let user = state.store.find_by_id(user_id).await?.ok_or_else(|| {
        tracing::info!(user_id = %user_id, outcome = "token_rejected", "Token user no longer exists");
        AppError::Unauthorized(USER_GONE.to_string())
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(user));

    Ok(next.run(request).await)
}

/// Type alias for role middleware future
type RoleMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>;

/// Middleware factory admitting only the listed roles
///
/// Must run after [`require_auth`].
///
/// ```ignore
/// let admin = Router::new()
///     .route("/admin/ping", get(ping_handler))
///     .route_layer(middleware::from_fn(restrict_to(&[Role::Admin])))
///     .route_layer(middleware::from_fn_with_state(state, require_auth));
/// ```
pub fn restrict_to(
    roles: &'static [Role],
) -> impl Fn(Request<Body>, Next) -> RoleMiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let Some((user_id, role)) = request
                .extensions()
                .get::<AuthenticatedUser>()
                .map(|user| (user.user_id, user.role))
            else {
                return Err(AppError::Unauthorized(NOT_AUTHORIZED.to_string()));
            };

            if !allowed(role, roles) {
                tracing::info!(user_id = %user_id, role = %role, outcome = "forbidden", "Role not permitted");
                return Err(AppError::Forbidden(FORBIDDEN.to_string()));
            }

            Ok(next.run(request).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("bearer abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authenticated_user_from_user() {
        let user = User {
            id: UserId::new(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        };

        let authenticated = AuthenticatedUser::from(user.clone());
        assert_eq!(authenticated.user_id, user.id);
        assert_eq!(authenticated.email, "jane@example.com");
        assert!(authenticated.is_admin());
    }
}
