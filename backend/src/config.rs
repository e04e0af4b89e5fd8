//! Runtime configuration, read from the environment (and an optional `.env`).

use std::net::SocketAddr;

use dotenvy::dotenv;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL must not be empty")]
    EmptyDatabaseUrl,

    #[error("DB_MAX_CONNECTIONS must be at least 1")]
    InvalidPoolSize,

    #[error("Invalid bind address {0}")]
    InvalidAddress(String),
}

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// SQLite connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Signs flash cookies
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// Tracing filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_url() -> String {
    "sqlite:banks.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_secret_key() -> String {
    DEFAULT_SECRET_KEY.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are loaded first if the file exists.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from explicit key/value pairs instead of the process environment
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(pairs)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_pairs(Vec::new()).unwrap();

        assert_eq!(config.database_url, "sqlite:banks.db");
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.port, 5001);
        assert_eq!(config.log_level, "info");
        assert!(config.uses_default_secret());
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:5001");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_pairs(pairs(&[
            ("DATABASE_URL", "sqlite:/tmp/other.db"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("SECRET_KEY", "s3cret"),
            ("DB_MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.database_url, "sqlite:/tmp/other.db");
        assert_eq!(config.db_max_connections, 2);
        assert!(!config.uses_default_secret());
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let result = Config::from_pairs(pairs(&[("PORT", "not-a-port")]));
        assert!(matches!(result, Err(ConfigError::Env(_))));
    }

    #[test]
    fn test_empty_database_url_is_rejected() {
        let result = Config::from_pairs(pairs(&[("DATABASE_URL", "  ")]));
        assert!(matches!(result, Err(ConfigError::EmptyDatabaseUrl)));
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let result = Config::from_pairs(pairs(&[("HOST", "not a host")]));
        assert!(matches!(result, Err(ConfigError::InvalidAddress(_))));
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let result = Config::from_pairs(pairs(&[("DB_MAX_CONNECTIONS", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidPoolSize)));
    }
}
