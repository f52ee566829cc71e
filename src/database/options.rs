use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::config::DatabaseConfig;

const APPLICATION_NAME: &str = "tenant-router";

/// Connection parameters shared by every tenant; only the host varies.
#[derive(Debug, Clone)]
pub struct ConnectionTemplate {
    user: String,
    password: String,
    database: String,
    port: u16,
    encrypt: bool,
    trust_server_certificate: bool,
}

impl ConnectionTemplate {
    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self {
            user: config.user.clone(),
            password: config.password.clone(),
            database: config.database.clone(),
            port: config.port,
            encrypt: config.encrypt,
            trust_server_certificate: config.trust_server_certificate,
        }
    }

    pub fn ssl_mode(&self) -> PgSslMode {
        match (self.encrypt, self.trust_server_certificate) {
            (false, _) => PgSslMode::Disable,
            (true, true) => PgSslMode::Require,
            (true, false) => PgSslMode::VerifyFull,
        }
    }

    /// Connection options for one tenant host
    pub fn options_for(&self, host: &str) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database)
            .ssl_mode(self.ssl_mode())
            .application_name(APPLICATION_NAME);

        if !self.password.is_empty() {
            options = options.password(&self.password);
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Environment};

    fn template(encrypt: bool, trust: bool) -> ConnectionTemplate {
        let mut config = AppConfig::for_environment(Environment::Development).database;
        config.encrypt = encrypt;
        config.trust_server_certificate = trust;
        ConnectionTemplate::from_config(&config)
    }

    #[test]
    fn substitutes_host_and_keeps_template() {
        let mut config = AppConfig::for_environment(Environment::Development).database;
        config.port = 15432;
        config.database = "inventory".to_string();
        let options = ConnectionTemplate::from_config(&config).options_for("10.0.0.7");

        assert_eq!(options.get_host(), "10.0.0.7");
        assert_eq!(options.get_port(), 15432);
        assert_eq!(options.get_database(), Some("inventory"));
        assert_eq!(options.get_username(), "warehouse");
    }

    #[test]
    fn tls_flags_map_to_ssl_modes() {
        assert!(matches!(template(false, true).ssl_mode(), PgSslMode::Disable));
        assert!(matches!(template(true, true).ssl_mode(), PgSslMode::Require));
        assert!(matches!(template(true, false).ssl_mode(), PgSslMode::VerifyFull));
    }
}
