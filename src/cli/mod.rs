pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use crate::config::{self, AppConfig};
use crate::registry::{loader, TenantRegistry};

#[derive(Parser)]
#[command(name = "tenantctl")]
#[command(about = "Inspect the tenant registry and tenant database connectivity")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Tenant registry lookups")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Tenant database connectivity")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "API token management")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Registry as the server would load it
pub fn load_registry(config: &AppConfig) -> anyhow::Result<TenantRegistry> {
    Ok(loader::load(&config.registry, config.environment)?)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = config::config();

    match cli.command {
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, config, output_format),
        Commands::Db { cmd } => commands::db::handle(cmd, config, output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, config, output_format),
    }
}
