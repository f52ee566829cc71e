//! Tenant registry and host resolution.
//!
//! The registry is built once at startup from configuration and never
//! mutated afterwards, so lookups are plain scans over an in-memory list.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::Environment;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Tenant not found: {0}")]
    NotFound(String),

    #[error("Tenant is inactive: {0}")]
    Inactive(String),

    #[error("Invalid tenant registry: {0}")]
    Invalid(String),

    #[error("Failed to read tenant registry: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse tenant registry: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// A logical customer/site mapped to one physical database host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: String,
    pub host: String,
    #[serde(default)]
    pub factories: Vec<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Environments in which this tenant may serve factory lookups.
    /// `None` admits every environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environments: Option<Vec<Environment>>,
}

fn default_active() -> bool {
    true
}

impl TenantRecord {
    pub fn serves(&self, factory_code: &str) -> bool {
        self.factories.iter().any(|f| f == factory_code)
    }

    pub fn admitted_in(&self, environment: Environment) -> bool {
        self.environments
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&environment))
    }
}

#[derive(Debug, Clone)]
pub struct TenantRegistry {
    tenants: Vec<TenantRecord>,
    environment: Environment,
}

impl TenantRegistry {
    /// Build and validate the registry. Any violation is a startup error.
    pub fn new(tenants: Vec<TenantRecord>, environment: Environment) -> Result<Self, RegistryError> {
        let mut ids = HashSet::new();
        for tenant in &tenants {
            if tenant.id.trim().is_empty() {
                return Err(RegistryError::Invalid("tenant id must not be empty".to_string()));
            }
            if !ids.insert(tenant.id.as_str()) {
                return Err(RegistryError::Invalid(format!("duplicate tenant id '{}'", tenant.id)));
            }
            if tenant.host.trim().is_empty() {
                return Err(RegistryError::Invalid(format!("tenant '{}' has no host", tenant.id)));
            }
        }

        // Overlapping owners are legal (failover, development tenants) but worth a note
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for tenant in tenants.iter().filter(|t| t.active && t.admitted_in(environment)) {
            for factory in &tenant.factories {
                if let Some(owner) = owners.insert(factory.as_str(), tenant.id.as_str()) {
                    tracing::warn!(
                        "Factory '{}' is served by more than one active tenant ('{}', '{}')",
                        factory,
                        owner,
                        tenant.id
                    );
                }
            }
        }

        Ok(Self { tenants, environment })
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn records(&self) -> &[TenantRecord] {
        &self.tenants
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    /// Lookup by id. Inactive tenants are still returned.
    pub fn find_by_id(&self, tenant_id: &str) -> Result<&TenantRecord, RegistryError> {
        self.tenants
            .iter()
            .find(|t| t.id == tenant_id)
            .ok_or_else(|| RegistryError::NotFound(tenant_id.to_string()))
    }

    /// Active tenants serving `factory_code` that are admitted in the
    /// current environment.
    pub fn find_by_factory(&self, factory_code: &str) -> Result<Vec<&TenantRecord>, RegistryError> {
        let matches: Vec<&TenantRecord> = self
            .tenants
            .iter()
            .filter(|t| t.active && t.admitted_in(self.environment) && t.serves(factory_code))
            .collect();

        if matches.is_empty() {
            return Err(RegistryError::NotFound(format!("no active tenant for factory '{}'", factory_code)));
        }
        Ok(matches)
    }

    /// Resolve a tenant for connection binding; inactive tenants are refused.
    pub fn resolve(&self, tenant_id: &str) -> Result<&TenantRecord, RegistryError> {
        let tenant = self.find_by_id(tenant_id)?;
        if !tenant.active {
            return Err(RegistryError::Inactive(tenant_id.to_string()));
        }
        Ok(tenant)
    }

    /// Active tenants whose database lives on `host`
    pub fn find_by_host(&self, host: &str) -> Result<Vec<&TenantRecord>, RegistryError> {
        let matches: Vec<&TenantRecord> = self
            .tenants
            .iter()
            .filter(|t| t.active && t.host == host)
            .collect();

        if matches.is_empty() {
            return Err(RegistryError::NotFound(format!("no active tenant on host '{}'", host)));
        }
        Ok(matches)
    }
}
