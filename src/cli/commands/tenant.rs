use clap::Subcommand;

use crate::cli::utils::output_tenants;
use crate::cli::{load_registry, OutputFormat};
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all registered tenants")]
    List,

    #[command(about = "Show one tenant, active or not")]
    Show {
        #[arg(help = "Tenant ID")]
        id: String,
    },

    #[command(about = "Active tenants serving a factory in the current environment")]
    Factory {
        #[arg(help = "Factory code")]
        code: String,
    },
}

pub fn handle(cmd: TenantCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let registry = load_registry(config)?;

    match cmd {
        TenantCommands::List => {
            let tenants: Vec<_> = registry.records().iter().collect();
            output_tenants(output_format, &tenants)
        }
        TenantCommands::Show { id } => {
            let tenant = registry.find_by_id(&id)?;
            output_tenants(output_format, &[tenant])
        }
        TenantCommands::Factory { code } => {
            let tenants = registry.find_by_factory(&code)?;
            output_tenants(output_format, &tenants)
        }
    }
}
