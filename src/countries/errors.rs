//! # Country Errors
//!
//! Error taxonomy of the shaping and query helper layer.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for country operations
pub type CountryResult<T> = Result<T, CountryError>;

/// Country layer errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CountryError {
    /// No document matched a single-entity lookup
    #[error("Country not found")]
    NotFound,

    /// A stored document lacks an expected field (data corruption)
    #[error("Stored document is missing field '{0}'")]
    MissingField(String),

    /// Caller input the helpers cannot use
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failure from the document collection, unmodified
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl CountryError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Whether the caller caused the failure
    pub fn is_client_error(&self) -> bool {
        match self {
            CountryError::NotFound | CountryError::InvalidRequest(_) => true,
            CountryError::MissingField(_) => false,
            CountryError::Storage(e) => e.is_client_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_pass_through() {
        let err = CountryError::from(StoreError::InvalidId("abc".to_string()));
        assert_eq!(err.to_string(), "Invalid identifier: abc");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_missing_field_is_server_side() {
        let err = CountryError::MissingField("Region".to_string());
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("Region"));
    }
}
