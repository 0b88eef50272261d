//! Provider contract
//!
//! The narrow boundary between callers and storage backends. The
//! in-memory store implements the synchronous contract; the asynchronous
//! mirror exists to wrap remote backends and differs only in when results
//! are delivered, never in algorithm - every sync provider is an async
//! provider for free.

use async_trait::async_trait;
use serde_json::Value;

use crate::query::Query;
use crate::store::{MemoryStore, Observer, Record, StoreResult, Update, WatchHandle};

/// Synchronous storage backend contract
pub trait Provider {
    /// Reads one record.
    fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Record>>;

    /// Inserts a record under a fresh identifier, returning it.
    fn add_item(&self, collection: &str, data: Value) -> StoreResult<String>;

    /// Replaces or inserts the record at `id`.
    fn set_item(&self, collection: &str, id: &str, data: Value) -> StoreResult<()>;

    /// Applies a partial update to an existing record.
    fn update_item(&self, collection: &str, id: &str, update: &Update) -> StoreResult<()>;

    /// Removes the record if present; missing records are a no-op.
    fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Counts the records the query would return.
    fn count_query(&self, collection: &str, query: &Query) -> StoreResult<usize>;

    /// Evaluates the query, returning the ordered matches.
    fn get_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>>;

    /// Replaces every matched record (un-limited match set), returning
    /// the count affected.
    fn set_query(&self, collection: &str, query: &Query, data: Value) -> StoreResult<usize>;

    /// Partially updates every matched record (un-limited match set),
    /// returning the count affected.
    fn update_query(&self, collection: &str, query: &Query, update: &Update)
        -> StoreResult<usize>;

    /// Deletes every matched record (un-limited match set), returning the
    /// count removed.
    fn delete_query(&self, collection: &str, query: &Query) -> StoreResult<usize>;

    /// Live subscription to one document.
    fn get_item_sequence(
        &self,
        collection: &str,
        id: &str,
        observer: Box<dyn Observer<Option<Record>>>,
    ) -> StoreResult<WatchHandle>;

    /// Live subscription to a query's result set.
    fn get_query_sequence(
        &self,
        collection: &str,
        query: Query,
        observer: Box<dyn Observer<Vec<Record>>>,
    ) -> StoreResult<WatchHandle>;
}

impl Provider for MemoryStore {
    fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        Ok(MemoryStore::get_item(self, collection, id))
    }

    fn add_item(&self, collection: &str, data: Value) -> StoreResult<String> {
        Ok(MemoryStore::add_item(self, collection, data))
    }

    fn set_item(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        MemoryStore::set_item(self, collection, id, data);
        Ok(())
    }

    fn update_item(&self, collection: &str, id: &str, update: &Update) -> StoreResult<()> {
        MemoryStore::update_item(self, collection, id, update)
    }

    fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()> {
        MemoryStore::delete_item(self, collection, id);
        Ok(())
    }

    fn count_query(&self, collection: &str, query: &Query) -> StoreResult<usize> {
        Ok(MemoryStore::count_query(self, collection, query))
    }

    fn get_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>> {
        Ok(MemoryStore::get_query(self, collection, query))
    }

    fn set_query(&self, collection: &str, query: &Query, data: Value) -> StoreResult<usize> {
        Ok(MemoryStore::set_query(self, collection, query, data))
    }

    fn update_query(
        &self,
        collection: &str,
        query: &Query,
        update: &Update,
    ) -> StoreResult<usize> {
        MemoryStore::update_query(self, collection, query, update)
    }

    fn delete_query(&self, collection: &str, query: &Query) -> StoreResult<usize> {
        Ok(MemoryStore::delete_query(self, collection, query))
    }

    fn get_item_sequence(
        &self,
        collection: &str,
        id: &str,
        observer: Box<dyn Observer<Option<Record>>>,
    ) -> StoreResult<WatchHandle> {
        Ok(MemoryStore::get_item_sequence(self, collection, id, observer))
    }

    fn get_query_sequence(
        &self,
        collection: &str,
        query: Query,
        observer: Box<dyn Observer<Vec<Record>>>,
    ) -> StoreResult<WatchHandle> {
        Ok(MemoryStore::get_query_sequence(self, collection, query, observer))
    }
}

/// Asynchronous mirror of [`Provider`]
///
/// Identical surface wrapped in futures. The blanket implementation
/// delegates straight to the synchronous contract, so the result is the
/// same value the sync call would have produced.
#[async_trait]
pub trait AsyncProvider: Send + Sync {
    async fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Record>>;
    async fn add_item(&self, collection: &str, data: Value) -> StoreResult<String>;
    async fn set_item(&self, collection: &str, id: &str, data: Value) -> StoreResult<()>;
    async fn update_item(&self, collection: &str, id: &str, update: &Update) -> StoreResult<()>;
    async fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()>;
    async fn count_query(&self, collection: &str, query: &Query) -> StoreResult<usize>;
    async fn get_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>>;
    async fn set_query(&self, collection: &str, query: &Query, data: Value)
        -> StoreResult<usize>;
    async fn update_query(
        &self,
        collection: &str,
        query: &Query,
        update: &Update,
    ) -> StoreResult<usize>;
    async fn delete_query(&self, collection: &str, query: &Query) -> StoreResult<usize>;
    async fn get_item_sequence(
        &self,
        collection: &str,
        id: &str,
        observer: Box<dyn Observer<Option<Record>>>,
    ) -> StoreResult<WatchHandle>;
    async fn get_query_sequence(
        &self,
        collection: &str,
        query: Query,
        observer: Box<dyn Observer<Vec<Record>>>,
    ) -> StoreResult<WatchHandle>;
}

#[async_trait]
impl<P> AsyncProvider for P
where
    P: Provider + Send + Sync,
{
    async fn get_item(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        Provider::get_item(self, collection, id)
    }

    async fn add_item(&self, collection: &str, data: Value) -> StoreResult<String> {
        Provider::add_item(self, collection, data)
    }

    async fn set_item(&self, collection: &str, id: &str, data: Value) -> StoreResult<()> {
        Provider::set_item(self, collection, id, data)
    }

    async fn update_item(&self, collection: &str, id: &str, update: &Update) -> StoreResult<()> {
        Provider::update_item(self, collection, id, update)
    }

    async fn delete_item(&self, collection: &str, id: &str) -> StoreResult<()> {
        Provider::delete_item(self, collection, id)
    }

    async fn count_query(&self, collection: &str, query: &Query) -> StoreResult<usize> {
        Provider::count_query(self, collection, query)
    }

    async fn get_query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Record>> {
        Provider::get_query(self, collection, query)
    }

    async fn set_query(
        &self,
        collection: &str,
        query: &Query,
        data: Value,
    ) -> StoreResult<usize> {
        Provider::set_query(self, collection, query, data)
    }

    async fn update_query(
        &self,
        collection: &str,
        query: &Query,
        update: &Update,
    ) -> StoreResult<usize> {
        Provider::update_query(self, collection, query, update)
    }

    async fn delete_query(&self, collection: &str, query: &Query) -> StoreResult<usize> {
        Provider::delete_query(self, collection, query)
    }

    async fn get_item_sequence(
        &self,
        collection: &str,
        id: &str,
        observer: Box<dyn Observer<Option<Record>>>,
    ) -> StoreResult<WatchHandle> {
        Provider::get_item_sequence(self, collection, id, observer)
    }

    async fn get_query_sequence(
        &self,
        collection: &str,
        query: Query,
        observer: Box<dyn Observer<Vec<Record>>>,
    ) -> StoreResult<WatchHandle> {
        Provider::get_query_sequence(self, collection, query, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_satisfies_provider() {
        let store = MemoryStore::new();
        let provider: &dyn Provider = &store;

        let id = provider.add_item("users", json!({"name": "Alice"})).unwrap();
        let record = provider.get_item("users", &id).unwrap().unwrap();
        assert_eq!(record.data["name"], json!("Alice"));

        provider.delete_item("users", &id).unwrap();
        assert!(provider.get_item("users", &id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_async_mirror_delegates_to_sync() {
        let store = MemoryStore::new();

        let id = AsyncProvider::add_item(&store, "users", json!({"n": 1}))
            .await
            .unwrap();
        let record = AsyncProvider::get_item(&store, "users", &id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.data, json!({"n": 1}));

        let count = AsyncProvider::count_query(&store, "users", &Query::new())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
