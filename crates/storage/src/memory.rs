//! In-memory table store implementation

use async_trait::async_trait;
use common::Table;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageError;
use crate::traits::{StoreResult, TableStore};

/// In-memory table store
///
/// Fast but non-persistent. Used by tests and by dry runs that should not
/// touch the spreadsheet.
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<String, Table>>,
    /// Number of successful `replace_table` calls
    writes: AtomicU64,
}

impl InMemoryTableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    /// Create a store pre-populated with one table
    pub fn with_table(mut self, name: impl Into<String>, table: Table) -> Self {
        self.tables.get_mut().insert(name.into(), table);
        self
    }

    /// Insert or overwrite a table without counting it as a write
    pub async fn insert(&self, name: impl Into<String>, table: Table) {
        self.tables.write().await.insert(name.into(), table);
    }

    /// Current content of a table
    pub async fn snapshot(&self, name: &str) -> Option<Table> {
        self.tables.read().await.get(name).cloned()
    }

    /// Number of `replace_table` calls that succeeded
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryTableStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TableStore for InMemoryTableStore {
    async fn fetch_table(&self, name: &str) -> StoreResult<Table> {
        let tables = self.tables.read().await;
        let mut table = tables
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        table.name = name.to_string();
        debug!(table = name, rows = table.len(), "Fetched table");
        Ok(table)
    }

    async fn replace_table(&self, name: &str, table: &Table) -> StoreResult<()> {
        let mut stored = table.clone();
        stored.name = name.to_string();
        self.tables.write().await.insert(name.to_string(), stored);
        self.writes.fetch_add(1, Ordering::Relaxed);
        debug!(table = name, rows = table.len(), "Replaced table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn table() -> Table {
        Table::new(
            "",
            vec!["email1".into(), "email2".into(), "count".into()],
            vec![vec!["a@x".into(), "b@x".into(), "1".into()]],
        )
    }

    #[tokio::test]
    async fn test_replace_then_fetch() {
        let store = InMemoryTableStore::new();
        store.replace_table("history", &table()).await.unwrap();

        let fetched = store.fetch_table("history").await.unwrap();
        assert_eq!(fetched.name, "history");
        assert_eq!(fetched.len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = InMemoryTableStore::new();
        assert_matches!(
            store.fetch_table("nope").await,
            Err(StorageError::NotFound(name)) if name == "nope"
        );
    }

    #[tokio::test]
    async fn test_insert_is_not_a_write() {
        let store = InMemoryTableStore::new();
        store.insert("subscribers", table()).await;
        assert!(store.snapshot("subscribers").await.is_some());
        assert_eq!(store.write_count(), 0);
    }
}
