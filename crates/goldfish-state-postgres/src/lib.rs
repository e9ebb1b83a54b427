//! PostgreSQL document store for the Goldfish lab data tracker
//!
//! Documents are stored as JSONB rows in a single `documents` table. Filters
//! are translated into JSON path expressions and single-document updates run
//! under a row lock, which gives the per-document atomicity the core stores
//! rely on.

use std::sync::Arc;
use tracing::info;

use goldfish_core::document::{GRAPH_COLLECTION, PROCESS_COLLECTION};
use goldfish_core::{Collections, StoreError};

pub mod collection;
pub mod connection;
pub mod migrations;
pub mod query;

pub use collection::PostgresCollection;
pub use connection::{PostgresConfig, PostgresConnection};

/// Open a pool and build the graph and process collections on it
pub async fn connect(config: &PostgresConfig) -> Result<Collections, StoreError> {
    let conn = PostgresConnection::new(config).await?;
    info!(
        max_connections = config.max_connections,
        migrations = config.run_migrations,
        "Connected to PostgreSQL document store"
    );
    Ok(collections(conn))
}

/// Collections handle over an existing connection
pub fn collections(conn: PostgresConnection) -> Collections {
    Collections::new(
        Arc::new(PostgresCollection::new(conn.clone(), GRAPH_COLLECTION)),
        Arc::new(PostgresCollection::new(conn, PROCESS_COLLECTION)),
    )
}
