//!
//! Goldfish Server - HTTP API for the Goldfish lab data tracker
//!
//! This crate wires configuration, logging and the document store together
//! and exposes the graph and process operations over HTTP.

use tracing::{info, warn};

use goldfish_core::Collections;
use goldfish_state_inmemory::InMemoryStoreProvider;

/// API routes and handlers
pub mod api;

/// Server configuration
pub mod config;

/// Error types
pub mod error;

/// Demo data seeding
pub mod seed;

/// Server implementation
pub mod server;

pub use config::{LogFormat, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::GoldfishServer;

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    init_logging(&config);

    let collections = open_collections(&config).await?;
    let server = GoldfishServer::new(config, collections);

    server.run().await
}

/// Initialize logging
pub fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = fmt().with_env_filter(filter).with_target(true);
    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if result.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }

    // configuration is read before a subscriber exists
    for warning in config.warnings() {
        warn!("{}", warning);
    }
}

/// Open the document store named by `database_url`
pub async fn open_collections(config: &ServerConfig) -> ServerResult<Collections> {
    config.validate()?;

    if config.database_url.starts_with("memory://") {
        info!("Using in-memory document store");
        return Ok(InMemoryStoreProvider::new().collections());
    }

    open_postgres(config).await
}

#[cfg(feature = "postgres")]
async fn open_postgres(config: &ServerConfig) -> ServerResult<Collections> {
    use goldfish_state_postgres::PostgresConfig;

    let pg_config = PostgresConfig {
        connection_string: config.database_url.clone(),
        max_connections: config.database_max_connections,
        acquire_timeout_secs: config.database_acquire_timeout_secs,
        run_migrations: config.database_run_migrations,
    };
    Ok(goldfish_state_postgres::connect(&pg_config).await?)
}

#[cfg(not(feature = "postgres"))]
async fn open_postgres(config: &ServerConfig) -> ServerResult<Collections> {
    Err(ServerError::ConfigError(format!(
        "{} requires the postgres feature",
        config.database_url
    )))
}
