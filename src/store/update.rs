//! Partial update documents
//!
//! An update is an ordered list of (field path, operation) pairs applied
//! to an existing record. Operations are enum-tagged variants, not
//! duck-typed shapes: a literal replacement, a numeric increment, an
//! array append, or a field removal. Applying an update never mutates the
//! input record; it produces a new value.

use serde_json::{Map, Value};

use crate::query::{FieldPath, PathSegment, QueryResult};

use super::errors::{StoreError, StoreResult};

/// A single update operation
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Replace the field with a literal value, creating intermediate
    /// objects along the path
    Set(Value),
    /// Add to a numeric field. A missing field starts at zero; a
    /// non-numeric field is an error.
    Increment(f64),
    /// Push values onto an array field. A missing field starts as an
    /// empty array; a non-array field is an error.
    Append(Vec<Value>),
    /// Remove the field. Removing a missing field is a no-op.
    Remove,
}

/// An ordered partial update over one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    ops: Vec<(FieldPath, UpdateOp)>,
}

impl Update {
    /// The empty update
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a literal replacement.
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> QueryResult<Self> {
        self.ops
            .push((FieldPath::parse(path)?, UpdateOp::Set(value.into())));
        Ok(self)
    }

    /// Adds a numeric increment.
    pub fn increment(mut self, path: &str, delta: f64) -> QueryResult<Self> {
        self.ops
            .push((FieldPath::parse(path)?, UpdateOp::Increment(delta)));
        Ok(self)
    }

    /// Adds an array append.
    pub fn append(mut self, path: &str, values: Vec<Value>) -> QueryResult<Self> {
        self.ops
            .push((FieldPath::parse(path)?, UpdateOp::Append(values)));
        Ok(self)
    }

    /// Adds a field removal.
    pub fn remove(mut self, path: &str) -> QueryResult<Self> {
        self.ops.push((FieldPath::parse(path)?, UpdateOp::Remove));
        Ok(self)
    }

    /// True when no operations are present
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies every operation in order, returning the new record.
    pub fn apply(&self, record: &Value) -> StoreResult<Value> {
        let mut next = record.clone();
        for (path, op) in &self.ops {
            apply_op(&mut next, path, op)?;
        }
        Ok(next)
    }
}

fn apply_op(record: &mut Value, path: &FieldPath, op: &UpdateOp) -> StoreResult<()> {
    match op {
        UpdateOp::Set(value) => {
            let slot = resolve_creating(record, path)?;
            *slot = value.clone();
        }
        UpdateOp::Increment(delta) => {
            let slot = resolve_creating(record, path)?;
            let current = match slot {
                Value::Null => 0.0,
                Value::Number(n) => n.as_f64().unwrap_or(0.0),
                other => {
                    return Err(StoreError::invalid_update(
                        path,
                        format!("cannot increment {}", type_name(other)),
                    ));
                }
            };
            let next = current + delta;
            // Keep integral results as integers
            *slot = if next.fract() == 0.0 && next.abs() < (i64::MAX as f64) {
                Value::from(next as i64)
            } else {
                serde_json::Number::from_f64(next)
                    .map(Value::Number)
                    .ok_or_else(|| {
                        StoreError::invalid_update(path, "increment produced a non-finite number")
                    })?
            };
        }
        UpdateOp::Append(values) => {
            let slot = resolve_creating(record, path)?;
            if slot.is_null() {
                *slot = Value::Array(Vec::new());
            }
            match slot {
                Value::Array(items) => items.extend(values.iter().cloned()),
                other => {
                    return Err(StoreError::invalid_update(
                        path,
                        format!("cannot append to {}", type_name(other)),
                    ));
                }
            }
        }
        UpdateOp::Remove => remove_field(record, path),
    }
    Ok(())
}

/// Walks to the slot named by `path`, creating intermediate objects for
/// missing keys. Newly created leaves hold `null` so each operation can
/// decide its own starting value. Index segments must already exist.
fn resolve_creating<'a>(record: &'a mut Value, path: &FieldPath) -> StoreResult<&'a mut Value> {
    let mut current = record;
    for segment in path.segments() {
        current = match segment {
            PathSegment::Key(key) => {
                let object = match current {
                    Value::Object(object) => object,
                    Value::Null => {
                        *current = Value::Object(Map::new());
                        current.as_object_mut().expect("just assigned an object")
                    }
                    other => {
                        return Err(StoreError::invalid_update(
                            path,
                            format!("cannot descend into {} at {key:?}", type_name(other)),
                        ));
                    }
                };
                object.entry(key.clone()).or_insert(Value::Null)
            }
            PathSegment::Index(index) => current.get_mut(*index).ok_or_else(|| {
                StoreError::invalid_update(path, format!("index {index} out of bounds"))
            })?,
        };
    }
    Ok(current)
}

/// Removes the field named by `path` without creating anything along the
/// way. Any miss makes the removal a no-op.
fn remove_field(record: &mut Value, path: &FieldPath) {
    let (last, parents) = path
        .segments()
        .split_last()
        .expect("paths have at least one segment");

    let mut current = record;
    for segment in parents {
        let next = match segment {
            PathSegment::Key(key) => current.get_mut(key.as_str()),
            PathSegment::Index(index) => current.get_mut(*index),
        };
        match next {
            Some(value) => current = value,
            None => return,
        }
    }

    match last {
        PathSegment::Key(key) => {
            if let Value::Object(object) = current {
                object.remove(key.as_str());
            }
        }
        PathSegment::Index(index) => {
            if let Value::Array(items) = current {
                if *index < items.len() {
                    items.remove(*index);
                }
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
