//! Gatehouse API - authentication server
//!
//! Provides registration and login endpoints, bearer-token route protection
//! and role gating over a pluggable credential store.

pub mod auth;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use doc::ApiDoc;
use state::AppState;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let environment = state.config.server.environment;
    let cors = middleware::cors_layer(&state.config.server);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api", routes::api_routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(handlers::not_found)
        .layer(from_fn_with_state(environment, middleware::expose_error_details))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
