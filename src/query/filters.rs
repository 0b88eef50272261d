//! Ordered, immutable set of filter rules
//!
//! Matching is conjunction: every rule must pass, and the empty set passes
//! everything. `with`/`without` return new sets but share the existing
//! rule storage when nothing changed - the identity fast path is
//! observable and load-bearing.

use std::sync::Arc;

use serde_json::Value;

use super::filter::Filter;

/// Conjunction of filter rules
#[derive(Debug, Clone, PartialEq)]
pub struct Filters {
    rules: Arc<Vec<Filter>>,
}

impl Filters {
    /// The empty set, which matches everything
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Vec::new()),
        }
    }

    /// Builds a set from rules in order
    pub fn from_rules(rules: Vec<Filter>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// True when no rules are present
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Iterates rules in order
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.rules.iter()
    }

    /// True iff every contained rule matches
    pub fn matches(&self, record: &Value) -> bool {
        self.rules.iter().all(|rule| rule.matches(record))
    }

    /// Keeps matching records in order. An empty set returns its input
    /// unchanged, same allocation.
    pub fn transform(&self, mut records: Vec<Value>) -> Vec<Value> {
        if self.rules.is_empty() {
            return records;
        }
        records.retain(|record| self.matches(record));
        records
    }

    /// Appends a rule. Adding one equal to an existing rule is a no-op
    /// that shares the current storage.
    pub fn with(&self, rule: Filter) -> Self {
        if self.rules.contains(&rule) {
            return self.clone();
        }
        let mut rules = (*self.rules).clone();
        rules.push(rule);
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Removes every rule equal to `rule`, preserving the order of the
    /// remainder. Shares the current storage when nothing was removed.
    pub fn without(&self, rule: &Filter) -> Self {
        if !self.rules.contains(rule) {
            return self.clone();
        }
        let rules = self
            .rules
            .iter()
            .filter(|r| *r != rule)
            .cloned()
            .collect();
        Self {
            rules: Arc::new(rules),
        }
    }

    /// True when both handles share the same rule storage
    pub fn shares_rules_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.rules, &other.rules)
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Filter> for Filters {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self::from_rules(iter.into_iter().collect())
    }
}
