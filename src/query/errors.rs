//! # Query Errors
//!
//! Parse-time error types for the query subsystem. Malformed key syntax is
//! rejected here with a descriptive message, never silently coerced.

use thiserror::Error;

/// Result type for query construction and parsing
pub type QueryResult<T> = Result<T, QueryError>;

/// Query construction errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Malformed compact filter or sort key
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Malformed field path
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// Malformed query parameter object
    #[error("invalid query params: {0}")]
    InvalidParams(String),
}

impl QueryError {
    /// Create an invalid-key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
