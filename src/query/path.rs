//! Field path parsing and nested value extraction
//!
//! Paths use dotted/bracketed syntax: `profile.name`, `scores[2]`,
//! `a.b[0].c`. A path that fails to resolve yields "missing" (`None`),
//! which the comparator ranks above every present value.

use std::fmt;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key access
    Key(String),
    /// Array index access
    Index(usize),
}

/// A parsed field path into a (possibly nested) record field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parses dotted/bracketed path syntax.
    ///
    /// Rejected with a descriptive error: empty paths, empty segments
    /// (`a..b`, leading or trailing dots), unclosed brackets, non-numeric
    /// indexes, and text directly after a closing bracket.
    pub fn parse(raw: &str) -> QueryResult<Self> {
        if raw.is_empty() {
            return Err(QueryError::invalid_path(raw, "empty field path"));
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    } else if !after_bracket {
                        return Err(QueryError::invalid_path(raw, "empty path segment"));
                    }
                    after_bracket = false;
                    // A dot must introduce another segment
                    if chars.peek().is_none() {
                        return Err(QueryError::invalid_path(raw, "trailing dot"));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut current)));
                    } else if !after_bracket {
                        return Err(QueryError::invalid_path(raw, "index without a field name"));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(d) => {
                                return Err(QueryError::invalid_path(
                                    raw,
                                    format!("non-numeric index character {d:?}"),
                                ));
                            }
                            None => {
                                return Err(QueryError::invalid_path(raw, "unclosed bracket"));
                            }
                        }
                    }
                    let index: usize = digits
                        .parse()
                        .map_err(|_| QueryError::invalid_path(raw, "empty index"))?;
                    segments.push(PathSegment::Index(index));
                    after_bracket = true;
                }
                ']' => {
                    return Err(QueryError::invalid_path(raw, "unmatched closing bracket"));
                }
                _ => {
                    if after_bracket {
                        return Err(QueryError::invalid_path(
                            raw,
                            "expected '.' or '[' after index",
                        ));
                    }
                    current.push(c);
                }
            }
        }

        if !current.is_empty() {
            segments.push(PathSegment::Key(current));
        }

        debug_assert!(!segments.is_empty());
        Ok(Self { segments })
    }

    /// Walks the path through a record. Any miss yields `None`.
    pub fn get<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let mut current = record;
        for segment in &self.segments {
            current = match segment {
                PathSegment::Key(key) => current.get(key.as_str())?,
                PathSegment::Index(index) => current.get(*index)?,
            };
        }
        Some(current)
    }

    /// The parsed segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{key}")?;
                }
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
