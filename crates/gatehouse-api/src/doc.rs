//! OpenAPI documentation
//!
//! Served as JSON at `/api-docs/openapi.json` with Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the bearer token security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Gatehouse API",
        description = "Registration, login and bearer-token protected routes."
    ),
    paths(
        crate::handlers::auth::register_handler,
        crate::handlers::auth::login_handler,
        crate::handlers::auth::me_handler,
        crate::handlers::admin::ping_handler,
        crate::handlers::health::health_check,
        crate::handlers::health::readiness_check,
    ),
    components(schemas(
        crate::auth::RegisterRequest,
        crate::auth::LoginRequest,
        crate::handlers::auth::UserSummary,
        crate::handlers::auth::LoginUser,
        crate::handlers::auth::SummaryData,
        crate::handlers::auth::LoginData,
        crate::handlers::auth::RegisterResponse,
        crate::handlers::auth::LoginResponse,
        crate::handlers::auth::MeResponse,
        crate::handlers::admin::AdminPingResponse,
        crate::handlers::health::HealthResponse,
        crate::handlers::health::ReadinessResponse,
        crate::error::ApiError,
        gatehouse_core::Role,
        gatehouse_core::UserId,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "admin", description = "Role-gated routes"),
        (name = "health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;
