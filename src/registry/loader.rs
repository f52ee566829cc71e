//! Builds the tenant registry from configuration.
//!
//! The document may be YAML or JSON (JSON parses as YAML):
//!
//! ```yaml
//! tenants:
//!   - id: tenant-a
//!     host: 10.0.0.1
//!     factories: [F1]
//!   - id: tenant-dev
//!     host: 10.0.9.9
//!     factories: [F1]
//!     environments: [development]
//! ```

use serde::Deserialize;
use std::path::Path;

use super::{RegistryError, TenantRecord, TenantRegistry};
use crate::config::{Environment, RegistryConfig};

#[derive(Debug, Deserialize)]
struct RegistryDocument {
    #[serde(default)]
    tenants: Vec<TenantRecord>,
}

pub fn parse_records(document: &str) -> Result<Vec<TenantRecord>, RegistryError> {
    let parsed: RegistryDocument = serde_yaml::from_str(document)?;
    Ok(parsed.tenants)
}

pub fn load_file(path: impl AsRef<Path>) -> Result<Vec<TenantRecord>, RegistryError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    parse_records(&contents)
}

/// Load from the configured file, falling back to the inline document.
pub fn load(config: &RegistryConfig, environment: Environment) -> Result<TenantRegistry, RegistryError> {
    let records = match (&config.file, &config.inline) {
        (Some(path), _) => load_file(path)?,
        (None, Some(inline)) => parse_records(inline)?,
        (None, None) => {
            return Err(RegistryError::Invalid(
                "no tenant registry configured (set TENANT_REGISTRY_FILE or TENANT_REGISTRY)".to_string(),
            ))
        }
    };

    if records.is_empty() {
        return Err(RegistryError::Invalid("tenant registry is empty".to_string()));
    }

    let registry = TenantRegistry::new(records, environment)?;
    tracing::info!(
        "Loaded tenant registry: {} tenants ({:?})",
        registry.len(),
        registry.environment()
    );
    Ok(registry)
}
