//! Server implementation for the Goldfish Server

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use goldfish_core::{Collections, GraphStore, ProcessStore, Stores};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// The Goldfish server: configuration plus the store handle it serves
#[derive(Clone)]
pub struct GoldfishServer {
    config: ServerConfig,
    collections: Collections,
    stores: Stores,
}

impl GoldfishServer {
    /// Create a server over an already opened set of collections
    pub fn new(config: ServerConfig, collections: Collections) -> Self {
        let stores = Stores::new(&collections);
        Self {
            config,
            collections,
            stores,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn graphs(&self) -> &GraphStore {
        &self.stores.graphs
    }

    pub fn processes(&self) -> &ProcessStore {
        &self.stores.processes
    }

    /// Check that the document store answers
    pub async fn check_database_health(&self) -> ServerResult<bool> {
        Ok(self.collections.health_check().await?)
    }

    /// Serve the API until a shutdown signal arrives, then close the store
    pub async fn run(self) -> ServerResult<()> {
        info!("Starting Goldfish Server");

        let app = crate::api::build_router(Arc::new(self.clone()));

        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| ServerError::ConfigError(format!("Invalid bind address: {}", e)))?;
        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Shutting down, closing document store");
        if let Err(err) = self.collections.close().await {
            error!(?err, "Failed to close document store cleanly");
        }
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(?err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(?err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
