//! # Store Errors
//!
//! Error types for record store operations.

use thiserror::Error;

use crate::query::QueryError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Record does not exist; updates cannot create
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Update operator applied to a field of incompatible type
    #[error("invalid update at {path}: {reason}")]
    InvalidUpdate { path: String, reason: String },

    /// A bulk query write applied some records and failed others.
    /// Failures carry the record identifier and the reason.
    #[error("bulk write applied {applied} records, {} failed", failures.len())]
    Bulk {
        applied: usize,
        failures: Vec<(String, String)>,
    },

    /// Query construction failure
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl StoreError {
    /// Create a not-found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create an invalid-update error
    pub fn invalid_update(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidUpdate {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
