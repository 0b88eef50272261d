//! Query: filter set + sort set + limit, with cursor pagination
//!
//! `transform` applies filter, then sort, then limit, in that fixed order.
//! The order is load-bearing: limit semantics and cursor derivation both
//! assume records are filtered before they are ranked.

use serde_json::Value;

use super::errors::QueryResult;
use super::filter::Filter;
use super::filters::Filters;
use super::key::{Direction, FilterOp};
use super::sort::Sort;
use super::sorts::Sorts;

/// Which side of the reference record a cursor selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorSide {
    After,
    Before,
}

/// An immutable query over a collection of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Filters,
    sorts: Sorts,
    limit: Option<usize>,
}

impl Query {
    /// The empty query: no filters, no sorts, unbounded
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter rule parsed from a compact key and value.
    pub fn filter(&self, key: &str, value: impl Into<Value>) -> QueryResult<Self> {
        Ok(self.with_filter(Filter::new(key, value)?))
    }

    /// Appends a sort rule parsed from a compact key.
    pub fn sort(&self, key: &str) -> QueryResult<Self> {
        Ok(self.with_sort(Sort::new(key)?))
    }

    /// Appends an already-built filter rule.
    pub fn with_filter(&self, rule: Filter) -> Self {
        Self {
            filters: self.filters.with(rule),
            sorts: self.sorts.clone(),
            limit: self.limit,
        }
    }

    /// Appends an already-built sort rule.
    pub fn with_sort(&self, rule: Sort) -> Self {
        Self {
            filters: self.filters.clone(),
            sorts: self.sorts.with(rule),
            limit: self.limit,
        }
    }

    /// Sets the result limit, applied after filtering and sorting.
    pub fn max(&self, limit: usize) -> Self {
        Self {
            filters: self.filters.clone(),
            sorts: self.sorts.clone(),
            limit: Some(limit),
        }
    }

    /// Removes the limit.
    pub fn unbounded(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            sorts: self.sorts.clone(),
            limit: None,
        }
    }

    /// The filter set
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    /// The sort set
    pub fn sorts(&self) -> &Sorts {
        &self.sorts
    }

    /// The result limit, `None` for unbounded
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Filter, then sort, then limit.
    pub fn transform(&self, records: Vec<Value>) -> Vec<Value> {
        let records = self.filters.transform(records);
        let mut records = self.sorts.transform(records);
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }
        records
    }

    /// Derives cursor filters selecting records strictly after `record`
    /// under the current sort order.
    ///
    /// # Panics
    ///
    /// Panics when the query has no sort rules; "after" is meaningless
    /// without an ordering.
    pub fn after(&self, record: &Value) -> Self {
        self.cursor(record, CursorSide::After)
    }

    /// Derives cursor filters selecting records strictly before `record`
    /// under the current sort order.
    ///
    /// # Panics
    ///
    /// Panics when the query has no sort rules.
    pub fn before(&self, record: &Value) -> Self {
        self.cursor(record, CursorSide::Before)
    }

    /// One derived filter per sort rule: strict comparison for the last
    /// rule, inclusive for earlier rules, direction mirrored for
    /// descending rules.
    fn cursor(&self, record: &Value, side: CursorSide) -> Self {
        assert!(
            !self.sorts.is_empty(),
            "cursor pagination requires at least one sort rule"
        );

        let last = self.sorts.len() - 1;
        let mut filters = self.filters.clone();

        for (position, sort) in self.sorts.iter().enumerate() {
            let strict = position == last;
            // After a record under a descending rule means lower by the
            // field's natural order, so the comparison mirrors direction.
            let forward = match (side, sort.direction()) {
                (CursorSide::After, Direction::Asc) => true,
                (CursorSide::After, Direction::Desc) => false,
                (CursorSide::Before, Direction::Asc) => false,
                (CursorSide::Before, Direction::Desc) => true,
            };
            let op = match (forward, strict) {
                (true, true) => FilterOp::Gt,
                (true, false) => FilterOp::Gte,
                (false, true) => FilterOp::Lt,
                (false, false) => FilterOp::Lte,
            };

            // A reference record missing the sort field carries the
            // missing state, which ranks above every present value.
            let value = sort.path().get(record).cloned();
            filters = filters.with(Filter::from_parts(sort.path().clone(), op, value));
        }

        Self {
            filters,
            sorts: self.sorts.clone(),
            limit: self.limit,
        }
    }
}
