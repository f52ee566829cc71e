use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub registry: RegistryConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn from_name(name: &str) -> Self {
        match name {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Interval between heartbeat events on streaming routes
    pub sse_interval_secs: u64,
}

/// Connection parameter template shared by every tenant host.
/// Only the host differs between tenants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub database: String,
    pub port: u16,
    pub encrypt: bool,
    pub trust_server_certificate: bool,
    pub connect_timeout_secs: u64,
    pub max_connections: u32,
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Path to a YAML or JSON registry document
    pub file: Option<String>,
    /// Inline registry document, used when no file is configured
    pub inline: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub require_auth: bool,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = env::var("APP_ENV")
            .map(|v| Environment::from_name(&v))
            .unwrap_or(Environment::Development);

        // Set defaults based on environment, then override with specific env vars
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("TENANT_ROUTER_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SSE_INTERVAL_SECS") {
            self.server.sse_interval_secs = v.parse().unwrap_or(self.server.sse_interval_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DB_USER") {
            self.database.user = v;
        }
        if let Ok(v) = env::var("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Ok(v) = env::var("DB_NAME") {
            self.database.database = v;
        }
        if let Ok(v) = env::var("DB_PORT") {
            self.database.port = v.parse().unwrap_or(self.database.port);
        }
        if let Ok(v) = env::var("DB_ENCRYPT") {
            self.database.encrypt = v.parse().unwrap_or(self.database.encrypt);
        }
        if let Ok(v) = env::var("DB_TRUST_SERVER_CERTIFICATE") {
            self.database.trust_server_certificate =
                v.parse().unwrap_or(self.database.trust_server_certificate);
        }
        if let Ok(v) = env::var("DB_CONNECT_TIMEOUT_SECS") {
            self.database.connect_timeout_secs = v.parse().unwrap_or(self.database.connect_timeout_secs);
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DB_IDLE_TIMEOUT_SECS") {
            self.database.idle_timeout_secs = v.parse().unwrap_or(self.database.idle_timeout_secs);
        }

        // Registry source
        if let Ok(v) = env::var("TENANT_REGISTRY_FILE") {
            self.registry.file = Some(v);
        }
        if let Ok(v) = env::var("TENANT_REGISTRY") {
            self.registry.inline = Some(v);
        }

        // Security overrides
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("AUTH_REQUIRED") {
            self.security.require_auth = v.parse().unwrap_or(self.security.require_auth);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                sse_interval_secs: 5,
            },
            database: DatabaseConfig {
                user: "warehouse".to_string(),
                password: String::new(),
                database: "warehouse".to_string(),
                port: 5432,
                encrypt: false,
                trust_server_certificate: true,
                connect_timeout_secs: 30,
                max_connections: 5,
                idle_timeout_secs: 600,
            },
            registry: RegistryConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                require_auth: false,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                sse_interval_secs: 5,
            },
            database: DatabaseConfig {
                user: "warehouse".to_string(),
                password: String::new(),
                database: "warehouse".to_string(),
                port: 5432,
                encrypt: true,
                trust_server_certificate: true,
                connect_timeout_secs: 15,
                max_connections: 10,
                idle_timeout_secs: 300,
            },
            registry: RegistryConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                require_auth: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                sse_interval_secs: 10,
            },
            database: DatabaseConfig {
                user: "warehouse".to_string(),
                password: String::new(),
                database: "warehouse".to_string(),
                port: 5432,
                encrypt: true,
                trust_server_certificate: false,
                connect_timeout_secs: 10,
                max_connections: 20,
                idle_timeout_secs: 300,
            },
            registry: RegistryConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                require_auth: true,
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
