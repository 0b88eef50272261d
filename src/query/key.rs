//! Compact key syntax for filters and sorts
//!
//! Filter keys carry their operator in the key string: an optional leading
//! `!` (negation) and an optional suffix - `[]` for array containment or
//! one of `<`, `<=`, `>`, `>=`. Sort keys use a leading `!` for
//! descending. Unmatched combinations are parse errors, not fallthroughs.
//!
//! ```text
//! "age"      -> Is        "age>="    -> Gte
//! "!status"  -> Not       "tags[]"   -> Contains
//! "!tags[]"  -> Excludes  "!created" -> Desc (sort key)
//! ```

use std::fmt;

use super::errors::{QueryError, QueryResult};
use super::path::FieldPath;

/// Filter operator, inferred from key syntax at parse time.
///
/// `In` and `Out` are never produced by the parser directly; `Is`/`Not`
/// are promoted to them when the comparison value is an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Strict equality
    Is,
    /// Strict inequality
    Not,
    /// Field value is a member of the operand array
    In,
    /// Negation of `In`
    Out,
    /// Field array contains the operand
    Contains,
    /// Negation of `Contains`
    Excludes,
    /// Comparator less-than (strict)
    Lt,
    /// Comparator less-or-equal
    Lte,
    /// Comparator greater-than (strict)
    Gt,
    /// Comparator greater-or-equal
    Gte,
}

impl FilterOp {
    /// Returns the operation name for diagnostics
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Is => "is",
            FilterOp::Not => "not",
            FilterOp::In => "in",
            FilterOp::Out => "out",
            FilterOp::Contains => "contains",
            FilterOp::Excludes => "excludes",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
        }
    }

    /// Key decoration for the compact form: (leading, trailing).
    fn decoration(&self) -> (&'static str, &'static str) {
        match self {
            FilterOp::Is | FilterOp::In => ("", ""),
            FilterOp::Not | FilterOp::Out => ("!", ""),
            FilterOp::Contains => ("", "[]"),
            FilterOp::Excludes => ("!", "[]"),
            FilterOp::Lt => ("", "<"),
            FilterOp::Lte => ("", "<="),
            FilterOp::Gt => ("", ">"),
            FilterOp::Gte => ("", ">="),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.op_name())
    }
}

/// Sort direction, inferred from a leading `!` in the key syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Parses a compact filter key into its path and syntactic operator.
///
/// Never returns `In`/`Out`; array promotion happens at filter
/// construction where the comparison value is known.
pub fn parse_filter_key(raw: &str) -> QueryResult<(FieldPath, FilterOp)> {
    let (negated, rest) = match raw.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let (body, suffix) = split_suffix(rest);

    let op = match (negated, suffix) {
        (false, Suffix::None) => FilterOp::Is,
        (true, Suffix::None) => FilterOp::Not,
        (false, Suffix::Contains) => FilterOp::Contains,
        (true, Suffix::Contains) => FilterOp::Excludes,
        (false, Suffix::Lt) => FilterOp::Lt,
        (false, Suffix::Lte) => FilterOp::Lte,
        (false, Suffix::Gt) => FilterOp::Gt,
        (false, Suffix::Gte) => FilterOp::Gte,
        (true, _) => {
            return Err(QueryError::invalid_key(
                raw,
                "negation cannot combine with a comparison suffix",
            ));
        }
    };

    let path = FieldPath::parse(body)
        .map_err(|e| QueryError::invalid_key(raw, e.to_string()))?;
    Ok((path, op))
}

/// Serializes a path/operator pair back to the compact filter key form.
pub fn filter_key(path: &FieldPath, op: FilterOp) -> String {
    let (leading, trailing) = op.decoration();
    format!("{leading}{path}{trailing}")
}

/// Parses a compact sort key into its path and direction.
pub fn parse_sort_key(raw: &str) -> QueryResult<(FieldPath, Direction)> {
    let (direction, rest) = match raw.strip_prefix('!') {
        Some(rest) => (Direction::Desc, rest),
        None => (Direction::Asc, raw),
    };

    if !matches!(split_suffix(rest).1, Suffix::None) {
        return Err(QueryError::invalid_key(
            raw,
            "sort keys take no operator suffix",
        ));
    }

    let path = FieldPath::parse(rest)
        .map_err(|e| QueryError::invalid_key(raw, e.to_string()))?;
    Ok((path, direction))
}

/// Serializes a path/direction pair back to the compact sort key form.
pub fn sort_key(path: &FieldPath, direction: Direction) -> String {
    match direction {
        Direction::Asc => path.to_string(),
        Direction::Desc => format!("!{path}"),
    }
}

enum Suffix {
    None,
    Contains,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Splits an operator suffix off the key body. Two-character suffixes are
/// checked before their one-character prefixes.
fn split_suffix(raw: &str) -> (&str, Suffix) {
    for (marker, suffix) in [
        ("[]", Suffix::Contains),
        ("<=", Suffix::Lte),
        (">=", Suffix::Gte),
        ("<", Suffix::Lt),
        (">", Suffix::Gt),
    ] {
        if let Some(body) = raw.strip_suffix(marker) {
            return (body, suffix);
        }
    }
    (raw, Suffix::None)
}
