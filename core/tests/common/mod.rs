//! Shared fixtures for integration tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tasklist_core::adapter::PersistenceAdapter;
use tasklist_core::blob::MemoryBlobStore;
use tasklist_core::bridge::{Record, SqlBridge, SqliteBridge};
use tasklist_core::store::TaskStore;
use tasklist_core::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    CreateTable,
    Insert,
    Update,
    Delete,
    Query,
}

/// SQLite bridge that can be told to fail specific calls
#[derive(Clone)]
pub struct ScriptedBridge {
    inner: SqliteBridge,
    failing: Arc<Mutex<HashSet<Call>>>,
}

#[allow(dead_code)]
impl ScriptedBridge {
    pub fn new() -> Self {
        Self {
            inner: SqliteBridge::open_in_memory().unwrap(),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn fail(&self, call: Call) {
        self.failing.lock().unwrap().insert(call);
    }

    pub fn recover(&self, call: Call) {
        self.failing.lock().unwrap().remove(&call);
    }

    pub fn inner(&self) -> &SqliteBridge {
        &self.inner
    }

    fn check(&self, call: Call) -> Result<()> {
        if self.failing.lock().unwrap().contains(&call) {
            return Err(Error::Bridge(format!("scripted failure: {:?}", call)));
        }
        Ok(())
    }
}

#[async_trait]
impl SqlBridge for ScriptedBridge {
    async fn create_table(&self, table: &str, schema: &str) -> Result<()> {
        self.check(Call::CreateTable)?;
        self.inner.create_table(table, schema).await
    }

    async fn insert_data(&self, table: &str, data: Record) -> Result<i64> {
        self.check(Call::Insert)?;
        self.inner.insert_data(table, data).await
    }

    async fn update_data(&self, table: &str, data: Record, filter: Record) -> Result<()> {
        self.check(Call::Update)?;
        self.inner.update_data(table, data, filter).await
    }

    async fn delete_data(&self, table: &str, filter: Record) -> Result<()> {
        self.check(Call::Delete)?;
        self.inner.delete_data(table, filter).await
    }

    async fn query_data(&self, query: &str, params: Vec<Value>) -> Result<Vec<Record>> {
        self.check(Call::Query)?;
        self.inner.query_data(query, params).await
    }
}

/// Store over an optional bridge and a shared blob slot, without seeding
#[allow(dead_code)]
pub fn store_with(bridge: Option<Arc<dyn SqlBridge>>, blob: &MemoryBlobStore) -> TaskStore {
    let adapter = PersistenceAdapter::new(bridge, Arc::new(blob.clone()));
    TaskStore::new(Arc::new(adapter)).with_seed(false)
}
