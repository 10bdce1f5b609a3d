//! Host database bridge
//!
//! The structured backend is reached through this contract. A host may or may
//! not provide it; callers receive it as an `Option<Arc<dyn SqlBridge>>`.

mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::Result;

pub use sqlite::SqliteBridge;

/// One row or one set of column values, keyed by column name
pub type Record = Map<String, Value>;

/// Table-oriented database capability offered by the host
#[async_trait]
pub trait SqlBridge: Send + Sync {
    /// Create a table from a column definition list.
    ///
    /// Whether an existing table is an error is up to the implementation.
    async fn create_table(&self, table: &str, schema: &str) -> Result<()>;

    /// Insert one row and return its auto-increment id
    async fn insert_data(&self, table: &str, data: Record) -> Result<i64>;

    /// Set `data` on every row matching all `filter` columns
    async fn update_data(&self, table: &str, data: Record, filter: Record) -> Result<()>;

    /// Delete every row matching all `filter` columns
    async fn delete_data(&self, table: &str, filter: Record) -> Result<()>;

    /// Run a parameterized query and return its rows
    async fn query_data(&self, query: &str, params: Vec<Value>) -> Result<Vec<Record>>;
}
