//!
//! Goldfish Core - domain model and stores for the Goldfish lab data tracker
//!
//! Graphs (research projects) own ordered lists of process steps. This crate
//! defines both document types, the collection abstraction they are stored
//! through, and the stores that keep the parent/child links consistent
//! when processes are created, deleted or reordered.

#![forbid(unsafe_code)]

/// Domain layer - graph and process documents
pub mod domain;

/// Document collection abstraction, filters and updates
pub mod document;

/// Application services - GraphStore and ProcessStore
pub mod application;

/// Error types
pub mod error;

pub use application::{GraphDeletion, GraphStore, ProcessStore, Stores};
pub use document::{
    Collections, Document, DocumentCollection, Filter, StoreError, Update, UpdateOp, UpdateOutcome,
};
pub use domain::{ElasticDataPaths, FileLocationType, Graph, NewGraph, NewProcess, Process};
pub use error::{CoreError, CoreResult};
