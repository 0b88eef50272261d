//! Single ordering rule over a record field
//!
//! Built on the total-order comparator; `transform` is a stable sort so
//! records that compare equal keep their relative order.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::compare::{compare, compare_desc};
use super::errors::QueryResult;
use super::key::{parse_sort_key, sort_key, Direction};
use super::path::FieldPath;

/// A single ordering rule: field path plus direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    path: FieldPath,
    direction: Direction,
}

impl Sort {
    /// Constructs a sort rule from a compact key (`"created"`,
    /// `"!created"` for descending).
    pub fn new(key: &str) -> QueryResult<Self> {
        let (path, direction) = parse_sort_key(key)?;
        Ok(Self { path, direction })
    }

    /// Ranks two records by their extracted field values.
    pub fn rank(&self, left: &Value, right: &Value) -> Ordering {
        let (left, right) = (self.path.get(left), self.path.get(right));
        match self.direction {
            Direction::Asc => compare(left, right),
            Direction::Desc => compare_desc(left, right),
        }
    }

    /// Stable sort under this rule.
    pub fn transform(&self, mut records: Vec<Value>) -> Vec<Value> {
        records.sort_by(|a, b| self.rank(a, b));
        records
    }

    /// The compact key this rule serializes to
    pub fn key(&self) -> String {
        sort_key(&self.path, self.direction)
    }

    /// The field path
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// The sort direction
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.path, self.direction.as_str())
    }
}
