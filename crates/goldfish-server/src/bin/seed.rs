//! Populate the configured document store with one demo graph

use anyhow::{Context, Result};
use goldfish_core::Stores;
use goldfish_server::config::ServerConfig;
use goldfish_server::seed::{seed_demo_data, DEFAULT_PROCESS_COUNT};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load().context("Failed to load configuration")?;
    goldfish_server::init_logging(&config);

    let process_count = match std::env::var("SEED_PROCESS_COUNT") {
        Ok(raw) => raw.parse::<usize>().unwrap_or_else(|_| {
            warn!("Invalid SEED_PROCESS_COUNT value: {}", raw);
            DEFAULT_PROCESS_COUNT
        }),
        Err(_) => DEFAULT_PROCESS_COUNT,
    };

    let collections = goldfish_server::open_collections(&config)
        .await
        .context("Failed to open document store")?;
    let stores = Stores::new(&collections);

    let graph = seed_demo_data(&stores, process_count)
        .await
        .context("Failed to seed demo data")?;
    println!("{}", graph.id);

    if config.database_url.starts_with("memory://") {
        warn!("Seeded an in-memory store; the data is gone when this process exits");
    }

    collections.close().await.context("Failed to close document store")?;
    Ok(())
}
