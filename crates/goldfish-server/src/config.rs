//! Configuration for the Goldfish Server
//!
//! Values come from environment variables, after an optional `.env` file
//! has been loaded into the environment.

use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{ServerError, ServerResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub bind_address: String,

    /// Document store URL, `memory://...` or `postgres://...`
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum pooled database connections
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout")]
    pub database_acquire_timeout_secs: u64,

    /// Create or upgrade the schema on start-up
    #[serde(default = "default_run_migrations")]
    pub database_run_migrations: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Problems found while reading the environment, logged once logging is up
    #[serde(skip)]
    warnings: Vec<String>,
}

fn default_port() -> u16 {
    8000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_database_url() -> String {
    "memory://local".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_run_migrations() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

impl ServerConfig {
    /// Load configuration from environment variables and an optional `.env` file
    pub fn load() -> ServerResult<Self> {
        // a missing .env file is fine
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> ServerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Start with defaults
        let mut config = Self::default();

        if let Some(port) = lookup("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                config.port = port;
            } else {
                config.warn(format!("Invalid SERVER_PORT value: {}", port));
            }
        }

        if let Some(host) = lookup("SERVER_HOST") {
            config.bind_address = host;
        }

        if let Some(database_url) = lookup("DATABASE_URL") {
            config.database_url = database_url;
        }

        if let Some(max) = lookup("DATABASE_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(max) if max > 0 => config.database_max_connections = max,
                _ => config.warn(format!("Invalid DATABASE_MAX_CONNECTIONS value: {}", max)),
            }
        }

        if let Some(timeout) = lookup("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse::<u64>() {
                config.database_acquire_timeout_secs = timeout;
            } else {
                config.warn(format!("Invalid DATABASE_ACQUIRE_TIMEOUT_SECS value: {}", timeout));
            }
        }

        if let Some(run) = lookup("DATABASE_RUN_MIGRATIONS") {
            config.database_run_migrations = run.to_lowercase() == "true" || run == "1";
        }

        if let Some(log_level) = lookup("LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => config.log_format = LogFormat::Json,
                "pretty" => config.log_format = LogFormat::Pretty,
                _ => config.warn(format!("Invalid LOG_FORMAT value: {}, using pretty", format)),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Warnings collected while loading, for the caller to log after
    /// `init_logging`
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Check values that cannot be defaulted
    pub fn validate(&self) -> ServerResult<()> {
        if self.database_url.is_empty() {
            return Err(ServerError::ConfigError("DATABASE_URL must not be empty".to_string()));
        }
        if !self.database_url.starts_with("memory://")
            && !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(ServerError::ConfigError(format!(
                "Unsupported DATABASE_URL scheme: {}",
                self.database_url
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_host(),
            database_url: default_database_url(),
            database_max_connections: default_max_connections(),
            database_acquire_timeout_secs: default_acquire_timeout(),
            database_run_migrations: default_run_migrations(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            warnings: Vec::new(),
        }
    }
}
