//! Single-field predicate over a record
//!
//! A filter is a value object: path, operator and comparison value are
//! fixed at construction. Matching is strict - no type coercion anywhere.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::compare::compare;
use super::errors::QueryResult;
use super::key::{filter_key, parse_filter_key, FilterOp};
use super::path::FieldPath;

/// A single predicate over one (possibly nested) field of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    path: FieldPath,
    op: FilterOp,
    /// `None` is the missing-field state. Only cursor derivation produces
    /// it; parsed filters always carry a value.
    value: Option<Value>,
}

impl Filter {
    /// Constructs a filter from a compact key and a comparison value.
    ///
    /// An array value promotes `Is` to `In` and `Not` to `Out` at
    /// construction; the operator is immutable afterwards.
    pub fn new(key: &str, value: impl Into<Value>) -> QueryResult<Self> {
        let (path, op) = parse_filter_key(key)?;
        Ok(Self::from_parts(path, op, Some(value.into())))
    }

    /// Constructs a filter from already-parsed parts (cursor derivation);
    /// `None` compares as the missing-field state.
    pub(crate) fn from_parts(path: FieldPath, op: FilterOp, value: Option<Value>) -> Self {
        let op = match (op, value.as_ref().is_some_and(Value::is_array)) {
            (FilterOp::Is, true) => FilterOp::In,
            (FilterOp::Not, true) => FilterOp::Out,
            (op, _) => op,
        };
        Self { path, op, value }
    }

    /// Checks whether a record satisfies this predicate.
    pub fn matches(&self, record: &Value) -> bool {
        let field = self.path.get(record);
        let value = self.value.as_ref();

        match self.op {
            FilterOp::Is => field == value,
            FilterOp::Not => field != value,
            FilterOp::In => Self::member_of_operand(field, value),
            FilterOp::Out => !Self::member_of_operand(field, value),
            FilterOp::Contains => Self::field_contains(field, value),
            FilterOp::Excludes => !Self::field_contains(field, value),
            FilterOp::Lt => compare(field, value) == Ordering::Less,
            FilterOp::Lte => compare(field, value) != Ordering::Greater,
            FilterOp::Gt => compare(field, value) == Ordering::Greater,
            FilterOp::Gte => compare(field, value) != Ordering::Less,
        }
    }

    /// Keeps matching records, preserving order and the input allocation.
    pub fn transform(&self, mut records: Vec<Value>) -> Vec<Value> {
        records.retain(|record| self.matches(record));
        records
    }

    /// The field value strict-equals a member of the operand array.
    /// `IN []` matches nothing.
    fn member_of_operand(field: Option<&Value>, operand: Option<&Value>) -> bool {
        match (field, operand.and_then(Value::as_array)) {
            (Some(field), Some(members)) => members.contains(field),
            _ => false,
        }
    }

    /// The field array strict-contains the operand. Non-array fields
    /// contain nothing.
    fn field_contains(field: Option<&Value>, operand: Option<&Value>) -> bool {
        match (field.and_then(Value::as_array), operand) {
            (Some(members), Some(operand)) => members.contains(operand),
            _ => false,
        }
    }

    /// The compact key this filter serializes to
    pub fn key(&self) -> String {
        filter_key(&self.path, self.op)
    }

    /// The field path
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// The operator
    pub fn op(&self) -> FilterOp {
        self.op
    }

    /// The comparison value; `None` is the missing-field state
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{} {} {}", self.path, self.op, value),
            None => write!(f, "{} {} missing", self.path, self.op),
        }
    }
}
