use thiserror::Error;

use crate::document::StoreError;

/// Core error type for the Goldfish stores
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No document matched the given id or filter
    #[error("{0} not found")]
    NotFound(String),

    /// A call into the document collection failed
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A stored document could not be decoded into a domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CoreError {
    /// Build a not-found error for a document kind and id
    pub fn not_found(kind: &str, id: &str) -> Self {
        CoreError::NotFound(format!("{} {}", kind, id))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidFilter(msg) => CoreError::ValidationError(format!("Invalid filter: {}", msg)),
            StoreError::InvalidUpdate(msg) => CoreError::ValidationError(format!("Invalid update: {}", msg)),
            StoreError::Serialization(msg) => CoreError::SerializationError(msg),
            other => CoreError::OperationFailed(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_core_categories() {
        assert_eq!(
            CoreError::from(StoreError::InvalidFilter("bad".into())),
            CoreError::ValidationError("Invalid filter: bad".into())
        );
        assert!(matches!(
            CoreError::from(StoreError::Backend("connection reset".into())),
            CoreError::OperationFailed(_)
        ));
        assert!(matches!(
            CoreError::from(StoreError::DuplicateKey("g1".into())),
            CoreError::OperationFailed(_)
        ));
    }

    #[test]
    fn not_found_message_names_the_kind() {
        let err = CoreError::not_found("Graph", "g1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Graph g1 not found");
    }
}
