//! Query-object mini-language
//!
//! A query serializes to a JSON object: every plain key is a compact
//! filter key with its comparison value, `$order` holds a sort key or a
//! list of them, `$limit` a non-negative integer. Parsing a serialized
//! query reproduces an equivalent rule set.

use serde_json::{Map, Value};

use super::errors::{QueryError, QueryResult};
use super::query::Query;

impl Query {
    /// Parses a query object.
    ///
    /// Unknown `$`-directives and malformed entries are rejected.
    pub fn parse(params: &Value) -> QueryResult<Self> {
        let object = params
            .as_object()
            .ok_or_else(|| QueryError::InvalidParams("expected an object".into()))?;

        let mut query = Query::new();
        for (key, value) in object {
            match key.as_str() {
                "$order" => {
                    for sort_key in order_keys(value)? {
                        query = query.sort(sort_key)?;
                    }
                }
                "$limit" => {
                    let limit = value.as_u64().ok_or_else(|| {
                        QueryError::InvalidParams(format!(
                            "$limit must be a non-negative integer, got {value}"
                        ))
                    })?;
                    query = query.max(limit as usize);
                }
                directive if directive.starts_with('$') => {
                    return Err(QueryError::InvalidParams(format!(
                        "unknown directive {directive:?}"
                    )));
                }
                filter_key => {
                    query = query.filter(filter_key, value.clone())?;
                }
            }
        }
        Ok(query)
    }

    /// Serializes back to the query-object form.
    ///
    /// Filters on the same compact key collapse to the last one, matching
    /// the object representation's single-key constraint.
    pub fn to_params(&self) -> Value {
        let mut object = Map::new();

        for filter in self.filters().iter() {
            // The missing-field state has no object form; null is its
            // closest representation.
            let value = filter.value().cloned().unwrap_or(Value::Null);
            object.insert(filter.key(), value);
        }

        match self.sorts().len() {
            0 => {}
            1 => {
                let key = self.sorts().iter().next().map(|s| s.key());
                object.insert("$order".into(), Value::String(key.unwrap_or_default()));
            }
            _ => {
                let keys: Vec<Value> = self
                    .sorts()
                    .iter()
                    .map(|s| Value::String(s.key()))
                    .collect();
                object.insert("$order".into(), Value::Array(keys));
            }
        }

        if let Some(limit) = self.limit() {
            object.insert("$limit".into(), Value::from(limit as u64));
        }

        Value::Object(object)
    }
}

/// `$order` accepts a single compact sort key or a list of them.
fn order_keys(value: &Value) -> QueryResult<Vec<&str>> {
    match value {
        Value::String(key) => Ok(vec![key.as_str()]),
        Value::Array(keys) => keys
            .iter()
            .map(|key| {
                key.as_str().ok_or_else(|| {
                    QueryError::InvalidParams(format!("$order entries must be strings, got {key}"))
                })
            })
            .collect(),
        other => Err(QueryError::InvalidParams(format!(
            "$order must be a string or list of strings, got {other}"
        ))),
    }
}
