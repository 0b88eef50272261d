//! Live subscription registry
//!
//! Document and query watchers per store, notified in subscription order
//! after each write. A watcher failure is isolated and logged; it never
//! aborts the triggering write or the other watchers' notifications.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use crate::query::Query;

use super::errors::StoreError;
use super::record::Record;

/// Sink for live subscription emissions.
///
/// `error` and `complete` are optional. `complete` fires once when the
/// subscription is cancelled. `error` is reserved for providers that can
/// fail mid-stream; the in-memory store never invokes it.
pub trait Observer<T>: Send + Sync {
    fn next(&self, value: T);
    fn error(&self, _err: &StoreError) {}
    fn complete(&self) {}
}

/// Plain closures observe with `next` only.
impl<T, F> Observer<T> for F
where
    F: Fn(T) + Send + Sync,
{
    fn next(&self, value: T) {
        self(value)
    }
}

pub(crate) struct ItemWatcher {
    id: Uuid,
    pub(crate) collection: String,
    pub(crate) item_id: String,
    observer: Box<dyn Observer<Option<Record>>>,
    /// Last emitted data, for change suppression. `None` = missing.
    last: Mutex<Option<Value>>,
}

pub(crate) struct QueryWatcher {
    id: Uuid,
    pub(crate) collection: String,
    pub(crate) query: Query,
    observer: Box<dyn Observer<Vec<Record>>>,
    /// Last emitted result set, compared by value.
    last: Mutex<Vec<Record>>,
}

/// Registry of live watchers for one store
#[derive(Default)]
pub(crate) struct WatcherRegistry {
    items: RwLock<Vec<Arc<ItemWatcher>>>,
    queries: RwLock<Vec<Arc<QueryWatcher>>>,
}

impl WatcherRegistry {
    /// Registers a document watcher seeded with the current value.
    pub(crate) fn watch_item(
        self: &Arc<Self>,
        collection: String,
        item_id: String,
        current: Option<Value>,
        observer: Box<dyn Observer<Option<Record>>>,
    ) -> (WatchHandle, Arc<ItemWatcher>) {
        let watcher = Arc::new(ItemWatcher {
            id: Uuid::new_v4(),
            collection,
            item_id,
            observer,
            last: Mutex::new(current),
        });
        self.items
            .write()
            .expect("watcher registry lock poisoned")
            .push(Arc::clone(&watcher));
        let handle = WatchHandle::new(Arc::downgrade(self), WatchKey::Item(watcher.id));
        (handle, watcher)
    }

    /// Registers a query watcher seeded with the current result set.
    pub(crate) fn watch_query(
        self: &Arc<Self>,
        collection: String,
        query: Query,
        current: Vec<Record>,
        observer: Box<dyn Observer<Vec<Record>>>,
    ) -> (WatchHandle, Arc<QueryWatcher>) {
        let watcher = Arc::new(QueryWatcher {
            id: Uuid::new_v4(),
            collection,
            query,
            observer,
            last: Mutex::new(current),
        });
        self.queries
            .write()
            .expect("watcher registry lock poisoned")
            .push(Arc::clone(&watcher));
        let handle = WatchHandle::new(Arc::downgrade(self), WatchKey::Query(watcher.id));
        (handle, watcher)
    }

    /// Document watchers for one collection/id, in subscription order.
    pub(crate) fn item_watchers(&self, collection: &str, item_id: &str) -> Vec<Arc<ItemWatcher>> {
        self.items
            .read()
            .expect("watcher registry lock poisoned")
            .iter()
            .filter(|w| w.collection == collection && w.item_id == item_id)
            .cloned()
            .collect()
    }

    /// Query watchers for one collection, in subscription order.
    pub(crate) fn query_watchers(&self, collection: &str) -> Vec<Arc<QueryWatcher>> {
        self.queries
            .read()
            .expect("watcher registry lock poisoned")
            .iter()
            .filter(|w| w.collection == collection)
            .cloned()
            .collect()
    }

    fn remove(&self, key: WatchKey) {
        match key {
            WatchKey::Item(id) => {
                let mut items = self.items.write().expect("watcher registry lock poisoned");
                if let Some(position) = items.iter().position(|w| w.id == id) {
                    let watcher = items.remove(position);
                    drop(items);
                    dispatch(&watcher.id, || watcher.observer.complete());
                }
            }
            WatchKey::Query(id) => {
                let mut queries = self.queries.write().expect("watcher registry lock poisoned");
                if let Some(position) = queries.iter().position(|w| w.id == id) {
                    let watcher = queries.remove(position);
                    drop(queries);
                    dispatch(&watcher.id, || watcher.observer.complete());
                }
            }
        }
    }
}

impl ItemWatcher {
    /// Emits when the value differs from the last emission.
    pub(crate) fn emit_if_changed(&self, data: Option<&Value>) {
        let mut last = self.last.lock().expect("watcher state lock poisoned");
        if last.as_ref() == data {
            return;
        }
        *last = data.cloned();
        drop(last);
        let record = data
            .cloned()
            .map(|data| Record::new(self.item_id.clone(), data));
        dispatch(&self.id, || self.observer.next(record.clone()));
    }

    /// Initial emission at subscribe time.
    pub(crate) fn emit_current(&self) {
        let current = self
            .last
            .lock()
            .expect("watcher state lock poisoned")
            .clone();
        let record = current.map(|data| Record::new(self.item_id.clone(), data));
        dispatch(&self.id, || self.observer.next(record.clone()));
    }
}

impl QueryWatcher {
    /// Emits when the result set differs by value from the last emission.
    pub(crate) fn emit_if_changed(&self, result: Vec<Record>) {
        let mut last = self.last.lock().expect("watcher state lock poisoned");
        if *last == result {
            return;
        }
        *last = result.clone();
        drop(last);
        dispatch(&self.id, || self.observer.next(result.clone()));
    }

    /// Initial emission at subscribe time.
    pub(crate) fn emit_current(&self) {
        let current = self
            .last
            .lock()
            .expect("watcher state lock poisoned")
            .clone();
        dispatch(&self.id, || self.observer.next(current.clone()));
    }
}

/// Runs one observer callback, isolating panics.
fn dispatch(watcher: &Uuid, callback: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(callback)) {
        let reason = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".into());
        error!(watcher = %watcher, %reason, "observer callback failed; notification isolated");
    }
}

#[derive(Clone, Copy)]
enum WatchKey {
    Item(Uuid),
    Query(Uuid),
}

/// Cancellation token for a live subscription.
///
/// `cancel` stops future notifications immediately and is idempotent.
pub struct WatchHandle {
    registry: Weak<WatcherRegistry>,
    key: WatchKey,
    cancelled: AtomicBool,
}

impl WatchHandle {
    fn new(registry: Weak<WatcherRegistry>, key: WatchKey) -> Self {
        Self {
            registry,
            key,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Cancels the subscription. Calling twice is a no-op.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.key);
            debug!("subscription cancelled");
        }
    }

    /// True once `cancel` has been called
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
