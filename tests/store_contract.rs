//! Record Store Contract Tests
//!
//! Behavior of the in-memory provider:
//! - CRUD semantics (fresh identifiers, idempotent delete, hard-error
//!   update on missing records)
//! - query evaluation over collections
//! - live document and query subscriptions (initial emission, one
//!   emission per effective change, idempotent cancel)
//! - the async mirror delegating to the sync store

use std::sync::{Arc, Mutex};

use corral::provider::AsyncProvider;
use corral::query::Query;
use corral::store::{MemoryStore, Record, StoreError, Update};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

/// Observer capturing every emitted query result set.
fn query_log() -> (
    Arc<Mutex<Vec<Vec<Record>>>>,
    Box<dyn corral::store::Observer<Vec<Record>>>,
) {
    let log: Arc<Mutex<Vec<Vec<Record>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let observer = Box::new(move |result: Vec<Record>| {
        sink.lock().unwrap().push(result);
    });
    (log, observer)
}

/// Observer capturing every emitted document state.
fn item_log() -> (
    Arc<Mutex<Vec<Option<Record>>>>,
    Box<dyn corral::store::Observer<Option<Record>>>,
) {
    let log: Arc<Mutex<Vec<Option<Record>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let observer = Box::new(move |record: Option<Record>| {
        sink.lock().unwrap().push(record);
    });
    (log, observer)
}

/// Honors RUST_LOG for debugging; safe to call from every test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn seed(store: &MemoryStore) {
    for i in 1..=5 {
        store.set_item(
            "tasks",
            &format!("t{i}"),
            json!({"id": format!("t{i}"), "n": i, "open": i % 2 == 1}),
        );
    }
}

// =============================================================================
// CRUD
// =============================================================================

/// add_item returns a previously-unused identifier the record is
/// immediately readable under.
#[test]
fn test_add_then_read_back() {
    let store = MemoryStore::new();
    let id = store.add_item("tasks", json!({"title": "write tests"}));

    let record = store.get_item("tasks", &id).unwrap();
    assert_eq!(record.id, id);
    assert_eq!(record.data["title"], json!("write tests"));

    let other = store.add_item("tasks", json!({"title": "another"}));
    assert_ne!(id, other);
}

/// delete_item on an unknown identifier neither throws nor changes the
/// collection.
#[test]
fn test_delete_unknown_is_noop() {
    let store = MemoryStore::new();
    seed(&store);

    store.delete_item("tasks", "nope");
    assert_eq!(store.count_query("tasks", &Query::new()), 5);
}

/// update_item on an unknown identifier is a hard error.
#[test]
fn test_update_unknown_is_error() {
    let store = MemoryStore::new();
    let update = Update::new().set("n", json!(0)).unwrap();

    let result = store.update_item("tasks", "nope", &update);
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}

/// set_item replaces the whole record; earlier snapshots stay intact.
#[test]
fn test_snapshots_stay_valid() {
    let store = MemoryStore::new();
    store.set_item("tasks", "t1", json!({"n": 1}));
    let before = store.get_item("tasks", "t1").unwrap();

    store.set_item("tasks", "t1", json!({"n": 2}));
    assert_eq!(before.data, json!({"n": 1}));
    assert_eq!(store.get_item("tasks", "t1").unwrap().data, json!({"n": 2}));
}

// =============================================================================
// Query Evaluation
// =============================================================================

/// get_query returns filtered, ordered, limited records with identifiers
/// carried alongside.
#[test]
fn test_get_query() {
    let store = MemoryStore::new();
    seed(&store);

    let query = Query::new()
        .filter("open", json!(true))
        .unwrap()
        .sort("!n")
        .unwrap()
        .max(2);
    let result = store.get_query("tasks", &query);

    let ids: Vec<_> = result.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["t5", "t3"]);
}

/// Bulk deletes ignore the limit: every match goes.
#[test]
fn test_delete_query_ignores_limit() {
    let store = MemoryStore::new();
    seed(&store);

    let query = Query::new()
        .filter("open", json!(true))
        .unwrap()
        .sort("n")
        .unwrap()
        .max(1);
    let removed = store.delete_query("tasks", &query);

    assert_eq!(removed, 3);
    assert_eq!(store.count_query("tasks", &Query::new()), 2);
}

/// Bulk updates report affected counts and surface per-record failures.
#[test]
fn test_update_query_best_effort() {
    let store = MemoryStore::new();
    store.set_item("tasks", "a", json!({"n": 1}));
    store.set_item("tasks", "b", json!({"n": "not a number"}));

    let update = Update::new().increment("n", 10.0).unwrap();
    match store.update_query("tasks", &Query::new(), &update) {
        Err(StoreError::Bulk { applied, failures }) => {
            assert_eq!(applied, 1);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].0, "b");
        }
        other => panic!("expected bulk failure, got {other:?}"),
    }
}

// =============================================================================
// Live Document Subscriptions
// =============================================================================

/// A document sequence emits the current state immediately, a missing
/// document as "no value".
#[test]
fn test_item_sequence_initial_emission() {
    let store = MemoryStore::new();
    let (log, observer) = item_log();

    let handle = store.get_item_sequence("tasks", "t1", observer);
    assert_eq!(log.lock().unwrap().as_slice(), &[None]);
    handle.cancel();
}

/// Each effective write emits exactly once; a write that stores the same
/// value emits nothing.
#[test]
fn test_item_sequence_change_driven() {
    let store = MemoryStore::new();
    let (log, observer) = item_log();
    let _handle = store.get_item_sequence("tasks", "t1", observer);

    store.set_item("tasks", "t1", json!({"n": 1}));
    store.set_item("tasks", "t1", json!({"n": 1})); // no change, no emission
    store.set_item("tasks", "t1", json!({"n": 2}));
    store.delete_item("tasks", "t1");

    let emissions = log.lock().unwrap();
    assert_eq!(emissions.len(), 4); // initial None + 3 changes
    assert_eq!(emissions[1].as_ref().unwrap().data, json!({"n": 1}));
    assert_eq!(emissions[2].as_ref().unwrap().data, json!({"n": 2}));
    assert!(emissions[3].is_none());
}

/// Writes to other documents or collections do not reach the watcher.
#[test]
fn test_item_sequence_scoped() {
    let store = MemoryStore::new();
    let (log, observer) = item_log();
    let _handle = store.get_item_sequence("tasks", "t1", observer);

    store.set_item("tasks", "t2", json!({"n": 2}));
    store.set_item("notes", "t1", json!({"n": 3}));

    assert_eq!(log.lock().unwrap().len(), 1); // initial emission only
}

// =============================================================================
// Live Query Subscriptions
// =============================================================================

/// A query sequence with no matches emits an empty ordered sequence
/// exactly once, then one emission per result-changing write.
#[test]
fn test_query_sequence_emissions() {
    let store = MemoryStore::new();
    let (log, observer) = query_log();

    let query = Query::new()
        .filter("open", json!(true))
        .unwrap()
        .sort("n")
        .unwrap();
    let _handle = store.get_query_sequence("tasks", query, observer);
    assert_eq!(log.lock().unwrap().as_slice(), &[Vec::<Record>::new()]);

    // Enters the result set
    store.set_item("tasks", "a", json!({"n": 2, "open": true}));
    // Does not match; result set unchanged, no emission
    store.set_item("tasks", "b", json!({"n": 1, "open": false}));
    // Matches and sorts before "a"
    store.set_item("tasks", "c", json!({"n": 1, "open": true}));

    let emissions = log.lock().unwrap();
    assert_eq!(emissions.len(), 3);
    let last: Vec<_> = emissions[2].iter().map(|r| r.id.as_str()).collect();
    assert_eq!(last, vec!["c", "a"]);
}

/// A record leaving the matched set re-emits the shrunken result.
#[test]
fn test_query_sequence_removal() {
    let store = MemoryStore::new();
    seed(&store);
    let (log, observer) = query_log();

    let query = Query::new().filter("open", json!(true)).unwrap().sort("n").unwrap();
    let _handle = store.get_query_sequence("tasks", query, observer);
    assert_eq!(log.lock().unwrap()[0].len(), 3);

    store.delete_item("tasks", "t3");

    let emissions = log.lock().unwrap();
    assert_eq!(emissions.len(), 2);
    let ids: Vec<_> = emissions[1].iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["t1", "t5"]);
}

/// Unsubscribing stops emissions even for writes that would have changed
/// the result; cancelling twice is a no-op.
#[test]
fn test_query_sequence_cancel() {
    let store = MemoryStore::new();
    let (log, observer) = query_log();

    let handle = store.get_query_sequence("tasks", Query::new(), observer);
    assert_eq!(log.lock().unwrap().len(), 1);

    handle.cancel();
    store.set_item("tasks", "t1", json!({"n": 1}));
    assert_eq!(log.lock().unwrap().len(), 1);

    handle.cancel(); // idempotent
}

/// One subscriber panicking does not starve the others.
#[test]
fn test_subscriber_isolation() {
    init_tracing();
    let store = MemoryStore::new();
    let (log, observer) = query_log();

    let _bad = store.get_query_sequence(
        "tasks",
        Query::new(),
        Box::new(|_: Vec<Record>| panic!("subscriber bug")),
    );
    let _good = store.get_query_sequence("tasks", Query::new(), observer);

    store.set_item("tasks", "t1", json!({"n": 1}));
    assert_eq!(log.lock().unwrap().len(), 2); // initial + change
}

/// Limit boundaries re-emit: a new record displacing the tail changes
/// the limited result.
#[test]
fn test_query_sequence_limit_boundary() {
    let store = MemoryStore::new();
    store.set_item("tasks", "a", json!({"n": 3}));
    store.set_item("tasks", "b", json!({"n": 5}));
    let (log, observer) = query_log();

    let query = Query::new().sort("n").unwrap().max(2);
    let _handle = store.get_query_sequence("tasks", query, observer);

    store.set_item("tasks", "c", json!({"n": 1})); // displaces "b"

    let emissions = log.lock().unwrap();
    assert_eq!(emissions.len(), 2);
    let ids: Vec<_> = emissions[1].iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a"]);
}

// =============================================================================
// Async Mirror
// =============================================================================

/// The async contract produces the same values the sync calls would.
#[tokio::test]
async fn test_async_provider_round_trip() {
    let store = MemoryStore::new();

    let id = AsyncProvider::add_item(&store, "tasks", json!({"n": 1, "id": "x"}))
        .await
        .unwrap();
    assert!(AsyncProvider::get_item(&store, "tasks", &id)
        .await
        .unwrap()
        .is_some());

    let update = Update::new().increment("n", 41.0).unwrap();
    AsyncProvider::update_item(&store, "tasks", &id, &update)
        .await
        .unwrap();
    let record = AsyncProvider::get_item(&store, "tasks", &id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.data["n"], json!(42));

    let count = AsyncProvider::count_query(&store, "tasks", &Query::new())
        .await
        .unwrap();
    assert_eq!(count, 1);

    AsyncProvider::delete_item(&store, "tasks", &id).await.unwrap();
    assert_eq!(
        AsyncProvider::count_query(&store, "tasks", &Query::new())
            .await
            .unwrap(),
        0
    );
}

/// Async deletion on a missing record mirrors the sync no-op.
#[tokio::test]
async fn test_async_delete_missing_is_ok() {
    let store = MemoryStore::new();
    assert!(AsyncProvider::delete_item(&store, "tasks", "nope").await.is_ok());
}
