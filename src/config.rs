//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::wallet::{LockOrder, WalletOptions};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Upper bound on a single row-lock wait; zero waits forever
    pub lock_timeout: Duration,

    /// Order in which transfer rows are locked
    pub lock_order: LockOrder,

    /// Reject debits that would overdraw an account
    pub enforce_sufficient_funds: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let lock_timeout_ms: u64 = lookup("LOCK_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("LOCK_TIMEOUT_MS"))?;

        let lock_order = match lookup("LOCK_ORDER") {
            Some(value) => value
                .parse::<LockOrder>()
                .map_err(|_| ConfigError::InvalidValue("LOCK_ORDER"))?,
            None => LockOrder::default(),
        };

        let enforce_sufficient_funds = lookup("ENFORCE_SUFFICIENT_FUNDS")
            .unwrap_or_else(|| "true".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("ENFORCE_SUFFICIENT_FUNDS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
            lock_order,
            enforce_sufficient_funds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Wallet core options derived from this configuration
    pub fn wallet_options(&self) -> WalletOptions {
        WalletOptions {
            lock_order: self.lock_order,
            enforce_funds: self.enforce_sufficient_funds,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
