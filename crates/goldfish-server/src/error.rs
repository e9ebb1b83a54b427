//! Error types for the Goldfish Server
//!
//! This module contains the error types used throughout the server.

use goldfish_core::{CoreError, StoreError};
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    /// Resource not found
    #[error("{0} not found")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The document store failed to carry out an operation
    #[error("Store error: {0}")]
    StoreError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl From<CoreError> for ServerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(what) => ServerError::NotFound(what),
            CoreError::ValidationError(msg) => ServerError::ValidationError(msg),
            CoreError::OperationFailed(msg) => ServerError::StoreError(msg),
            CoreError::SerializationError(msg) => {
                ServerError::InternalError(format!("Stored data is corrupt: {}", msg))
            }
        }
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::ValidationError(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::InternalError(format!("IO error: {}", err))
    }
}

impl ServerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServerError::NotFound(_))
    }
}
