//! # Store Errors
//!
//! Error types for the document collection layer.

use thiserror::Error;

/// Result type for collection operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document collection errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    // ==================
    // Malformed input
    // ==================
    /// Identifier string is not a valid object id
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Filter expression could not be parsed
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// Projection could not be parsed
    #[error("Invalid projection: {0}")]
    InvalidProjection(String),

    /// Sort specification could not be parsed
    #[error("Invalid sort: {0}")]
    InvalidSort(String),

    /// Update document could not be parsed or applied
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    /// Aggregation pipeline could not be parsed
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// Document is not a JSON object or carries an unusable `_id`
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Another document already uses this `_id`
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    // ==================
    // Collection failures
    // ==================
    /// Internal failure of the collection
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Stable error code for logs and API bodies
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidId(_) => "STORE_INVALID_ID",
            StoreError::InvalidFilter(_) => "STORE_INVALID_FILTER",
            StoreError::InvalidProjection(_) => "STORE_INVALID_PROJECTION",
            StoreError::InvalidSort(_) => "STORE_INVALID_SORT",
            StoreError::InvalidUpdate(_) => "STORE_INVALID_UPDATE",
            StoreError::InvalidPipeline(_) => "STORE_INVALID_PIPELINE",
            StoreError::InvalidDocument(_) => "STORE_INVALID_DOCUMENT",
            StoreError::DuplicateKey(_) => "STORE_DUPLICATE_KEY",
            StoreError::Internal(_) => "STORE_INTERNAL",
        }
    }

    /// Whether the caller supplied something the collection could not use
    pub fn is_client_error(&self) -> bool {
        !matches!(self, StoreError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors() {
        assert!(StoreError::InvalidId("x".to_string()).is_client_error());
        assert!(StoreError::DuplicateKey("x".to_string()).is_client_error());
        assert!(!StoreError::Internal("poisoned".to_string()).is_client_error());
    }

    #[test]
    fn test_display_includes_detail() {
        let err = StoreError::InvalidFilter("unknown operator $foo".to_string());
        assert_eq!(err.to_string(), "Invalid filter: unknown operator $foo");
        assert_eq!(err.code(), "STORE_INVALID_FILTER");
    }
}
