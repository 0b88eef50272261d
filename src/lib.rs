//! corral - an embeddable, in-memory record store with live queries
//!
//! A typed filter/sort/query engine over JSON records, a keyed collection
//! store behind a narrow Provider contract, and change-driven document and
//! query subscriptions.

pub mod provider;
pub mod query;
pub mod store;
