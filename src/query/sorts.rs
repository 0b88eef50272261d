//! Ordered, immutable set of sort rules
//!
//! Order is significant: the first rule is the primary tie-break. Ranking
//! tries each rule until one differs; `transform` is a single stable sort
//! under that combined comparator.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use super::sort::Sort;

/// Lexicographic composition of sort rules
#[derive(Debug, Clone, PartialEq)]
pub struct Sorts {
    rules: Arc<Vec<Sort>>,
}

impl Sorts {
    /// The empty set, under which every pair ranks equal
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Vec::new()),
        }
    }

    /// Builds a set from rules in tie-break order
    pub fn from_rules(rules: Vec<Sort>) -> Self {
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

    /// Iterates rules in tie-break order
    pub fn iter(&self) -> impl Iterator<Item = &Sort> {
        self.rules.iter()
    }

    /// First non-equal ranking among the rules, else `Equal`.
    pub fn rank(&self, left: &Value, right: &Value) -> Ordering {
        for rule in self.rules.iter() {
            match rule.rank(left, right) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }

    /// One stable sort under the combined comparator. An empty set returns
    /// its input unchanged, same allocation.
    pub fn transform(&self, mut records: Vec<Value>) -> Vec<Value> {
        if self.rules.is_empty() {
            return records;
        }
        records.sort_by(|a, b| self.rank(a, b));
        records
    }

    /// Appends a rule. Adding one equal to an existing rule is a no-op
    /// that shares the current storage.
    pub fn with(&self, rule: Sort) -> Self {
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
    pub fn without(&self, rule: &Sort) -> Self {
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

impl Default for Sorts {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Sort> for Sorts {
    fn from_iter<I: IntoIterator<Item = Sort>>(iter: I) -> Self {
        Self::from_rules(iter.into_iter().collect())
    }
}
