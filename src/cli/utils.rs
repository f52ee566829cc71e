use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::registry::TenantRecord;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print tenants as a table or a JSON collection
pub fn output_tenants(output_format: OutputFormat, tenants: &[&TenantRecord]) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "tenants": tenants }))?);
        }
        OutputFormat::Text => {
            if tenants.is_empty() {
                println!("No tenants configured");
                return Ok(());
            }

            println!("{:<20} {:<20} {:<8} {:<20} {}", "ID", "HOST", "ACTIVE", "ENVIRONMENTS", "FACTORIES");
            println!("{}", "-".repeat(90));
            for tenant in tenants {
                println!(
                    "{:<20} {:<20} {:<8} {:<20} {}",
                    tenant.id,
                    tenant.host,
                    if tenant.active { "yes" } else { "no" },
                    environments_label(tenant),
                    tenant.factories.join(",")
                );
            }
        }
    }
    Ok(())
}

fn environments_label(tenant: &TenantRecord) -> String {
    match &tenant.environments {
        None => "all".to_string(),
        Some(environments) => environments
            .iter()
            .map(|e| format!("{:?}", e).to_lowercase())
            .collect::<Vec<_>>()
            .join(","),
    }
}
