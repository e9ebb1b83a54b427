//! In-memory document store for the Goldfish lab data tracker
//!
//! Provides an in-memory implementation of the `DocumentCollection`
//! interface defined in goldfish-core. It is used for development, tests and
//! `memory://` deployments where persistence is not required.

use std::sync::Arc;

use goldfish_core::document::{GRAPH_COLLECTION, PROCESS_COLLECTION};
use goldfish_core::Collections;

pub mod collection;
pub use collection::InMemoryCollection;

/// Provider for the in-memory graph and process collections
pub struct InMemoryStoreProvider {
    graphs: Arc<InMemoryCollection>,
    processes: Arc<InMemoryCollection>,
}

impl InMemoryStoreProvider {
    /// Create a provider with two empty collections
    pub fn new() -> Self {
        Self {
            graphs: Arc::new(InMemoryCollection::new(GRAPH_COLLECTION)),
            processes: Arc::new(InMemoryCollection::new(PROCESS_COLLECTION)),
        }
    }

    /// Collections handle for the stores. Every handle created from the
    /// same provider shares the same data.
    pub fn collections(&self) -> Collections {
        Collections::new(self.graphs.clone(), self.processes.clone())
    }

    pub fn graphs(&self) -> &InMemoryCollection {
        &self.graphs
    }

    pub fn processes(&self) -> &InMemoryCollection {
        &self.processes
    }
}

impl Default for InMemoryStoreProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
