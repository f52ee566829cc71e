use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// Opens the physical connection behind a handle.
///
/// Composed at the entry point and injected into the connection cache,
/// so tests can count or fail connection attempts without a database.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, options: &PgConnectOptions) -> Result<PgPool, sqlx::Error>;
}

/// Production connector: a small sqlx pool per tenant host
#[derive(Debug, Clone)]
pub struct PgConnector {
    max_connections: u32,
    connect_timeout: Duration,
    idle_timeout: Duration,
}

impl PgConnector {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, options: &PgConnectOptions) -> Result<PgPool, sqlx::Error> {
        // connect_with verifies one connection before returning
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.connect_timeout)
            .idle_timeout(self.idle_timeout)
            .connect_with(options.clone())
            .await
    }
}
