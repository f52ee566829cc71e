use clap::{ArgGroup, Subcommand};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

use crate::cli::utils::output_success;
use crate::cli::{load_registry, OutputFormat};
use crate::config::AppConfig;
use crate::database::{ConnectionCache, ConnectionTemplate, PgConnector};

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Open a connection, run SELECT 1 and close it")]
    #[command(group(ArgGroup::new("target").required(true).args(["tenant", "host"])))]
    Ping {
        #[arg(long, help = "Tenant ID to resolve through the registry")]
        tenant: Option<String>,
        #[arg(long, help = "Database host served by an active tenant")]
        host: Option<String>,
    },
}

pub async fn handle(cmd: DbCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        DbCommands::Ping { tenant, host } => {
            let registry = load_registry(config)?;
            let host = match (tenant, host) {
                (Some(id), _) => registry.resolve(&id)?.host.clone(),
                (None, Some(host)) => {
                    registry.find_by_host(&host)?;
                    host
                }
                (None, None) => anyhow::bail!("either --tenant or --host is required"),
            };

            let cache = ConnectionCache::new(
                ConnectionTemplate::from_config(&config.database),
                Arc::new(PgConnector::from_config(&config.database)),
            );

            let started = Instant::now();
            let handle = cache.open_scoped(&host).await?;
            let result = handle.ping().await;
            handle.destroy().await;
            result?;

            let elapsed_ms = started.elapsed().as_millis() as u64;
            output_success(
                output_format,
                &format!("{} reachable in {} ms", host, elapsed_ms),
                Some(json!({ "host": host, "elapsed_ms": elapsed_ms })),
            )
        }
    }
}
