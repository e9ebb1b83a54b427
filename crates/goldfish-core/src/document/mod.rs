//! Document collection abstraction
//!
//! Graphs and processes are stored as schemaless JSON documents keyed by an
//! opaque `_id` string. Backends implement [`DocumentCollection`]; the stores
//! in [`crate::application`] only ever talk to this trait.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

pub mod filter;
pub mod update;

pub use filter::Filter;
pub use update::{Update, UpdateOp};

/// Name of the identifier field carried by every document
pub const ID_FIELD: &str = "_id";

/// Collection holding graph documents
pub const GRAPH_COLLECTION: &str = "graph_map";

/// Collection holding process step documents
pub const PROCESS_COLLECTION: &str = "process_step";

/// A stored document
pub type Document = Map<String, Value>;

/// Read the identifier of a document, if it has a string `_id`
pub fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Errors raised by a document collection backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Document with id {0} already exists")]
    DuplicateKey(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result of a single-document update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Number of documents the id matched (0 or 1)
    pub matched: u64,
    /// Number of documents whose content changed
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn not_matched() -> Self {
        Self::default()
    }

    pub fn matched(modified: bool) -> Self {
        Self {
            matched: 1,
            modified: u64::from(modified),
        }
    }
}

/// A named collection of JSON documents.
///
/// Every call is atomic with respect to the single document it touches.
/// `update_one` in particular must apply all operations of an [`Update`]
/// under the document's lock, so array operators never lose a concurrent
/// write.
#[async_trait]
pub trait DocumentCollection: Send + Sync {
    /// First document matching the filter, in insertion order
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;

    /// All documents matching the filter, in insertion order
    async fn find_many(&self, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Insert a document that already carries its `_id`
    async fn insert_one(&self, document: Document) -> Result<(), StoreError>;

    /// Apply an update to the document with the given id
    async fn update_one(&self, id: &str, update: &Update) -> Result<UpdateOutcome, StoreError>;

    /// Delete the document with the given id, returning the number removed
    async fn delete_one(&self, id: &str) -> Result<u64, StoreError>;

    /// Delete every document matching the filter, returning the number removed
    async fn delete_many(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }

    /// Release backend resources
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Handle to the two collections the service works with.
///
/// Built once at start-up, shared by the stores and closed on shutdown.
#[derive(Clone)]
pub struct Collections {
    pub graphs: Arc<dyn DocumentCollection>,
    pub processes: Arc<dyn DocumentCollection>,
}

impl Collections {
    pub fn new(graphs: Arc<dyn DocumentCollection>, processes: Arc<dyn DocumentCollection>) -> Self {
        Self { graphs, processes }
    }

    /// Healthy only when both collections answer
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        let graphs = self.graphs.health_check().await?;
        let processes = self.processes.health_check().await?;
        Ok(graphs && processes)
    }

    pub async fn close(&self) -> Result<(), StoreError> {
        self.graphs.close().await?;
        self.processes.close().await
    }
}
