use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tenant_router::app::{self, AppState};
use tenant_router::config;
use tenant_router::database::PgConnector;
use tenant_router::registry::loader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DB_* and TENANT_REGISTRY*
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config().clone();
    tracing::info!("Starting tenant-router in {:?} mode", config.environment);

    if config.security.require_auth && config.security.jwt_secret.is_empty() {
        anyhow::bail!("AUTH_REQUIRED is set but JWT_SECRET is empty");
    }

    // A broken registry is fatal at startup
    let registry = loader::load(&config.registry, config.environment).context("failed to load tenant registry")?;
    let connector = Arc::new(PgConnector::from_config(&config.database));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config, registry, connector);
    let cache = state.cache.clone();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("tenant-router listening on http://{}", bind_addr);

    axum::serve(listener, app::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cache.close_all().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
