//! Gatehouse API Server
//!
//! REST authentication server: registration, login and bearer-token
//! protected routes.
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use gatehouse_api::{create_router, state::AppState};
use gatehouse_core::{AppConfig, LoggingConfig, MemoryUserStore, PgUserStore, UserStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match std::env::var("GATEHOUSE_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)
            .and_then(AppConfig::with_env_override)
            .with_context(|| format!("Failed to load configuration from {path}"))?,
        Err(_) => AppConfig::from_env().context("Failed to load configuration")?,
    };

    init_tracing(&config.logging);

    // Connect the credential store
    let store: Arc<dyn UserStore> = match config.database.postgres_url.as_deref() {
        Some(url) => {
            let store = PgUserStore::connect(url, &config.database)
                .await
                .context("Failed to connect to PostgreSQL")?;
            store.migrate().await.context("Failed to run migrations")?;
            tracing::info!(pool_size = config.database.pool_size, "Using PostgreSQL credential store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory credential store");
            Arc::new(MemoryUserStore::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let environment = config.server.environment;

    // Create application state
    let state = Arc::new(AppState::new(config, store).context("Invalid password hashing parameters")?);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(?environment, "Gatehouse API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gatehouse API Server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "gatehouse_api={level},gatehouse_core={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
