//! Store traits for tabular data

use async_trait::async_trait;
use common::{RunMode, Table};

use crate::error::StorageError;

pub type StoreResult<T> = Result<T, StorageError>;

/// Trait for tabular storage
///
/// Tables are read and written whole. There is no partial update: the
/// carousel reads a table once at the start of a run and replaces it once
/// at the end.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Fetch a table; the first row of the stored grid is the header
    async fn fetch_table(&self, name: &str) -> StoreResult<Table>;

    /// Replace the whole content of a table
    async fn replace_table(&self, name: &str, table: &Table) -> StoreResult<()>;
}

/// Concrete table names for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub subscribers: String,
    pub history: String,
}

impl TableNames {
    /// Resolve names from config for the given run mode
    pub fn resolve(sheet: &config::SheetConfig, mode: RunMode) -> Self {
        Self {
            subscribers: mode.table_name(&sheet.subscribers_table, &sheet.test_suffix),
            history: mode.table_name(&sheet.history_table, &sheet.test_suffix),
        }
    }
}
