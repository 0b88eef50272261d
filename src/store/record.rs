//! Stored record shape
//!
//! The identifier is carried alongside the data, not merged into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored record: identifier plus data value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier within the collection
    pub id: String,
    /// The record value
    pub data: Value,
}

impl Record {
    /// Creates a record
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}
