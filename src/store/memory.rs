//! In-memory record store
//!
//! Collections map identifiers to record values. Records are replaced
//! wholesale on write, never patched in place, so previously returned
//! snapshots stay valid. Writes apply in call order; live watchers are
//! notified after the write that produced the change, in subscription
//! order.
//!
//! # Invariants
//!
//! - `set_item` notifies only when the stored value actually changed.
//! - `delete_item` is idempotent; `update_item` on a missing record is a
//!   hard error.
//! - Bulk query writes operate on the filtered, sorted, *un-limited*
//!   match set: limit bounds reads, not writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use crate::query::Query;

use super::errors::{StoreError, StoreResult};
use super::id::generate_id;
use super::record::Record;
use super::update::Update;
use super::watch::{Observer, WatchHandle, WatcherRegistry};

type Collection = BTreeMap<String, Value>;

/// The in-memory provider
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
    watchers: Arc<WatcherRegistry>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Item operations
    // =========================================================================

    /// Reads one record.
    pub fn get_item(&self, collection: &str, id: &str) -> Option<Record> {
        let collections = self.collections.read().expect("store lock poisoned");
        collections
            .get(collection)
            .and_then(|records| records.get(id))
            .map(|data| Record::new(id, data.clone()))
    }

    /// Inserts a record under a freshly generated identifier.
    pub fn add_item(&self, collection: &str, data: Value) -> String {
        let id = generate_id();
        {
            let mut collections = self.collections.write().expect("store lock poisoned");
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), data.clone());
        }
        debug!(collection, id = %id, "record added");
        self.notify(collection, &id, Some(&data));
        id
    }

    /// Replaces or inserts the record at `id`. Notifies only when the
    /// stored value actually changed.
    pub fn set_item(&self, collection: &str, id: &str, data: Value) {
        let changed = {
            let mut collections = self.collections.write().expect("store lock poisoned");
            let records = collections.entry(collection.to_string()).or_default();
            match records.get(id) {
                Some(existing) if *existing == data => false,
                _ => {
                    records.insert(id.to_string(), data.clone());
                    true
                }
            }
        };
        if changed {
            debug!(collection, id, "record set");
            self.notify(collection, id, Some(&data));
        }
    }

    /// Applies a partial update to an existing record. Updating a missing
    /// record is an error: there is nothing to update.
    pub fn update_item(&self, collection: &str, id: &str, update: &Update) -> StoreResult<()> {
        let next = {
            let mut collections = self.collections.write().expect("store lock poisoned");
            let records = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            let current = records
                .get(id)
                .ok_or_else(|| StoreError::not_found(collection, id))?;
            let next = update.apply(current)?;
            records.insert(id.to_string(), next.clone());
            next
        };
        debug!(collection, id, "record updated");
        self.notify(collection, id, Some(&next));
        Ok(())
    }

    /// Removes the record if present. Deleting a missing record is a
    /// silent no-op.
    pub fn delete_item(&self, collection: &str, id: &str) {
        let removed = {
            let mut collections = self.collections.write().expect("store lock poisoned");
            collections
                .get_mut(collection)
                .map(|records| records.remove(id).is_some())
                .unwrap_or(false)
        };
        if removed {
            debug!(collection, id, "record deleted");
            self.notify(collection, id, None);
        }
    }

    // =========================================================================
    // Query operations
    // =========================================================================

    /// Evaluates the query and returns the transformed ordered records.
    pub fn get_query(&self, collection: &str, query: &Query) -> Vec<Record> {
        self.evaluate(collection, query, true)
    }

    /// Counts the records the query would return, limit included.
    pub fn count_query(&self, collection: &str, query: &Query) -> usize {
        self.evaluate(collection, query, false)
            .len()
            .min(query.limit().unwrap_or(usize::MAX))
    }

    /// Replaces every matched record with `data`. Limit does not bound
    /// the match set. Returns the count affected.
    pub fn set_query(&self, collection: &str, query: &Query, data: Value) -> usize {
        let matched = self.evaluate(collection, query, false);
        for record in &matched {
            self.set_item(collection, &record.id, data.clone());
        }
        matched.len()
    }

    /// Applies a partial update to every matched record, best-effort.
    /// Limit does not bound the match set. Failures are collected and
    /// surfaced; they never silently skip.
    pub fn update_query(
        &self,
        collection: &str,
        query: &Query,
        update: &Update,
    ) -> StoreResult<usize> {
        let matched = self.evaluate(collection, query, false);
        let mut applied = 0;
        let mut failures = Vec::new();
        for record in &matched {
            match self.update_item(collection, &record.id, update) {
                Ok(()) => applied += 1,
                Err(err) => failures.push((record.id.clone(), err.to_string())),
            }
        }
        if failures.is_empty() {
            Ok(applied)
        } else {
            Err(StoreError::Bulk { applied, failures })
        }
    }

    /// Deletes every matched record. Limit does not bound the match set.
    /// Returns the count removed.
    pub fn delete_query(&self, collection: &str, query: &Query) -> usize {
        let matched = self.evaluate(collection, query, false);
        for record in &matched {
            self.delete_item(collection, &record.id);
        }
        matched.len()
    }

    // =========================================================================
    // Live subscriptions
    // =========================================================================

    /// Subscribes to one document. Emits the current value (possibly
    /// missing) immediately, then the new value after any write that
    /// changed it. The handle's `cancel` is idempotent.
    pub fn get_item_sequence(
        &self,
        collection: &str,
        id: &str,
        observer: Box<dyn Observer<Option<Record>>>,
    ) -> WatchHandle {
        let current = {
            let collections = self.collections.read().expect("store lock poisoned");
            collections
                .get(collection)
                .and_then(|records| records.get(id))
                .cloned()
        };
        let (handle, watcher) = self.watchers.watch_item(
            collection.to_string(),
            id.to_string(),
            current,
            observer,
        );
        watcher.emit_current();
        handle
    }

    /// Subscribes to a query. Emits the current transformed result
    /// immediately; after every write to the collection the query is
    /// re-evaluated and re-emitted only when the result differs by value.
    pub fn get_query_sequence(
        &self,
        collection: &str,
        query: Query,
        observer: Box<dyn Observer<Vec<Record>>>,
    ) -> WatchHandle {
        let current = self.evaluate(collection, &query, true);
        let (handle, watcher) =
            self.watchers
                .watch_query(collection.to_string(), query, current, observer);
        watcher.emit_current();
        handle
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Filter, sort, optionally limit, carrying identifiers alongside.
    fn evaluate(&self, collection: &str, query: &Query, apply_limit: bool) -> Vec<Record> {
        let mut matched: Vec<Record> = {
            let collections = self.collections.read().expect("store lock poisoned");
            collections
                .get(collection)
                .map(|records| {
                    records
                        .iter()
                        .filter(|(_, data)| query.filters().matches(data))
                        .map(|(id, data)| Record::new(id.clone(), data.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };
        matched.sort_by(|a, b| query.sorts().rank(&a.data, &b.data));
        if apply_limit {
            if let Some(limit) = query.limit() {
                matched.truncate(limit);
            }
        }
        matched
    }

    /// Notifies document watchers for the written id, then query watchers
    /// for the collection. Conservative: every query watcher re-evaluates
    /// on every effective write; suppression is by value.
    fn notify(&self, collection: &str, id: &str, data: Option<&Value>) {
        for watcher in self.watchers.item_watchers(collection, id) {
            watcher.emit_if_changed(data);
        }
        for watcher in self.watchers.query_watchers(collection) {
            let result = self.evaluate(collection, &watcher.query, true);
            watcher.emit_if_changed(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_then_get() {
        let store = MemoryStore::new();
        let id = store.add_item("users", json!({"name": "Alice"}));

        let record = store.get_item("users", &id).unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.data, json!({"name": "Alice"}));
    }

    #[test]
    fn test_add_generates_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.add_item("users", json!({"n": 1}));
        let b = store.add_item("users", json!({"n": 2}));
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_upserts() {
        let store = MemoryStore::new();
        store.set_item("users", "u1", json!({"n": 1}));
        assert_eq!(store.get_item("users", "u1").unwrap().data, json!({"n": 1}));

        store.set_item("users", "u1", json!({"n": 2}));
        assert_eq!(store.get_item("users", "u1").unwrap().data, json!({"n": 2}));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryStore::new();
        store.set_item("users", "u1", json!({"n": 1}));

        store.delete_item("users", "u1");
        assert!(store.get_item("users", "u1").is_none());

        // Unknown id: no error, no effect
        store.delete_item("users", "u1");
        store.delete_item("ghosts", "g1");
    }

    #[test]
    fn test_update_missing_record_is_error() {
        let store = MemoryStore::new();
        let update = Update::new().set("n", json!(1)).unwrap();

        let result = store.update_item("users", "missing", &update);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_update_applies_operators() {
        let store = MemoryStore::new();
        store.set_item("users", "u1", json!({"visits": 1, "tags": ["a"]}));

        let update = Update::new()
            .increment("visits", 1.0)
            .unwrap()
            .append("tags", vec![json!("b")])
            .unwrap();
        store.update_item("users", "u1", &update).unwrap();

        let record = store.get_item("users", "u1").unwrap();
        assert_eq!(record.data, json!({"visits": 2, "tags": ["a", "b"]}));
    }

    #[test]
    fn test_get_query_applies_limit() {
        let store = MemoryStore::new();
        for i in 1..=5 {
            store.set_item("nums", &format!("n{i}"), json!({"n": i}));
        }

        let query = Query::new().sort("!n").unwrap().max(2);
        let result = store.get_query("nums", &query);
        let ns: Vec<_> = result.iter().map(|r| r.data["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![5, 4]);
    }

    #[test]
    fn test_count_query_respects_limit() {
        let store = MemoryStore::new();
        for i in 1..=5 {
            store.set_item("nums", &format!("n{i}"), json!({"n": i}));
        }

        let query = Query::new().filter("n>", json!(1)).unwrap();
        assert_eq!(store.count_query("nums", &query), 4);
        assert_eq!(store.count_query("nums", &query.max(2)), 2);
    }

    #[test]
    fn test_bulk_writes_ignore_limit() {
        let store = MemoryStore::new();
        for i in 1..=5 {
            store.set_item("nums", &format!("n{i}"), json!({"n": i}));
        }

        let query = Query::new().sort("n").unwrap().max(2);
        let removed = store.delete_query("nums", &query);
        assert_eq!(removed, 5);
        assert_eq!(store.count_query("nums", &Query::new()), 0);
    }

    #[test]
    fn test_update_query_collects_failures() {
        let store = MemoryStore::new();
        store.set_item("users", "ok", json!({"visits": 1}));
        store.set_item("users", "bad", json!({"visits": "many"}));

        let update = Update::new().increment("visits", 1.0).unwrap();
        let result = store.update_query("users", &Query::new(), &update);

        match result {
            Err(StoreError::Bulk { applied, failures }) => {
                assert_eq!(applied, 1);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].0, "bad");
            }
            other => panic!("expected bulk failure, got {other:?}"),
        }
        // The compatible record was still updated
        assert_eq!(
            store.get_item("users", "ok").unwrap().data["visits"],
            json!(2)
        );
    }

    #[test]
    fn test_set_query_returns_affected_count() {
        let store = MemoryStore::new();
        for i in 1..=3 {
            store.set_item("nums", &format!("n{i}"), json!({"n": i}));
        }

        let query = Query::new().filter("n>", json!(1)).unwrap();
        let affected = store.set_query("nums", &query, json!({"n": 0}));
        assert_eq!(affected, 2);
        assert_eq!(store.get_item("nums", "n2").unwrap().data, json!({"n": 0}));
        assert_eq!(store.get_item("nums", "n1").unwrap().data, json!({"n": 1}));
    }
}
