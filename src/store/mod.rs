//! Record store subsystem
//!
//! An in-memory, collection-keyed record store with CRUD operations,
//! query evaluation delegating to the query engine, and live document
//! and query subscriptions.
//!
//! # Invariants
//!
//! - Writes apply in call order; watchers are notified after the write
//!   that produced the change, in subscription order.
//! - Records are replaced wholesale, never mutated in place.
//! - A watcher failure never aborts the triggering write or other
//!   watchers' notifications.

mod errors;
mod id;
mod memory;
mod record;
mod update;
mod watch;

pub use errors::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use record::Record;
pub use update::{Update, UpdateOp};
pub use watch::{Observer, WatchHandle};
