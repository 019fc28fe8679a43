//! Cross-cutting HTTP layers
//!
//! Author: hephaex@gmail.com

pub mod error_detail;

pub use error_detail::expose_error_details;

use axum::http::{header, HeaderValue, Method};
use gatehouse_core::ServerConfig;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// CORS policy for the configured origins
///
/// With no origins configured, development allows any origin and production
/// allows none.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return if config.environment.is_development() {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        };
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
