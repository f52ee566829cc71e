//! Test connectors and fixtures. Nothing here talks to a real database:
//! connectors hand out lazy pools that only connect when queried.

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::{AppConfig, Environment};
use crate::database::{ConnectionTemplate, Connector};
use crate::registry::{TenantRecord, TenantRegistry};

/// Counts connection attempts and returns pools that never dial out
#[derive(Debug, Default)]
pub struct LazyConnector {
    opened: AtomicUsize,
    delay: Option<Duration>,
}

impl LazyConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate connection latency to widen race windows
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            opened: AtomicUsize::new(0),
            delay: Some(delay),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for LazyConnector {
    async fn connect(&self, options: &PgConnectOptions) -> Result<PgPool, sqlx::Error> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(50))
            .connect_lazy_with(options.clone()))
    }
}

/// Every host is unreachable
#[derive(Debug, Default)]
pub struct FailingConnector;

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(&self, _options: &PgConnectOptions) -> Result<PgPool, sqlx::Error> {
        Err(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }
}

pub fn template() -> ConnectionTemplate {
    ConnectionTemplate::from_config(&AppConfig::for_environment(Environment::Development).database)
}

pub fn options(host: &str) -> PgConnectOptions {
    template().options_for(host)
}

pub fn registry() -> TenantRegistry {
    let tenant = |id: &str, host: &str, factory: &str, active: bool| TenantRecord {
        id: id.to_string(),
        host: host.to_string(),
        factories: vec![factory.to_string()],
        active,
        environments: None,
    };

    TenantRegistry::new(
        vec![
            tenant("tenant-a", "10.0.0.1", "F1", true),
            tenant("tenant-b", "10.0.0.2", "F1", false),
            tenant("tenant-c", "10.0.0.3", "F2", true),
        ],
        Environment::Development,
    )
    .expect("fixture registry is valid")
}
