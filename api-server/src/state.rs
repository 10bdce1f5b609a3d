//! Application state

use std::sync::Arc;
use tracing::{info, warn};

use tasklist_core::adapter::PersistenceAdapter;
use tasklist_core::blob::FileBlobStore;
use tasklist_core::bridge::{SqlBridge, SqliteBridge};
use tasklist_core::store::TaskStore;

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    adapter: Arc<PersistenceAdapter>,
    task_store: TaskStore,
}

impl AppState {
    /// Build state around an adapter. The store is left uninitialized.
    pub fn new(adapter: Arc<PersistenceAdapter>, seed: bool) -> Self {
        let task_store = TaskStore::new(adapter.clone()).with_seed(seed);
        Self {
            inner: Arc::new(AppStateInner {
                adapter,
                task_store,
            }),
        }
    }

    /// Wire up the backends described by `config`
    pub fn from_config(config: &ServerConfig) -> Self {
        let bridge: Option<Arc<dyn SqlBridge>> = if config.structured_backend {
            match SqliteBridge::open(&config.sqlite_path) {
                Ok(bridge) => {
                    info!("Using SQLite database: {:?}", config.sqlite_path);
                    Some(Arc::new(bridge))
                }
                Err(e) => {
                    warn!(error = %e, "SQLite database unavailable");
                    None
                }
            }
        } else {
            info!("Structured backend disabled by configuration");
            None
        };

        let blob = Arc::new(FileBlobStore::new(config.blob_path()));
        Self::new(Arc::new(PersistenceAdapter::new(bridge, blob)), config.seed)
    }

    /// Get reference to the task store
    pub fn task_store(&self) -> &TaskStore {
        &self.inner.task_store
    }

    /// Get reference to the persistence adapter
    pub fn adapter(&self) -> &PersistenceAdapter {
        &self.inner.adapter
    }
}
