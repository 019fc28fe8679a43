//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::auth::{require_auth, restrict_to};
use crate::handlers::{admin, auth};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use gatehouse_core::Role;
use std::sync::Arc;

/// Create `/api` routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/admin/ping",
            get(admin::ping_handler)
                .route_layer(middleware::from_fn(restrict_to(&[Role::Admin]))),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new().merge(public_routes).merge(protected_routes)
}
