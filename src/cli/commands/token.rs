use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::{load_registry, OutputFormat};
use crate::config::AppConfig;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a signed API token")]
    Issue {
        #[arg(long, help = "Token subject (operator or service name)")]
        subject: String,
        #[arg(long, help = "Restrict the token to one tenant")]
        tenant: Option<String>,
        #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub fn handle(cmd: TokenCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { subject, tenant, hours } => {
            if let Some(id) = &tenant {
                load_registry(config)?.find_by_id(id)?;
            }

            let hours = hours.unwrap_or(config.security.jwt_expiry_hours);
            let claims = Claims::new(subject, tenant, hours);
            let token = generate_jwt(&claims, &config.security.jwt_secret)?;

            match output_format {
                OutputFormat::Json => output_success(
                    output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_at": claims.exp })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
    }
}
