//! Process-local blob slot

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::BlobStore;
use crate::Result;

/// In-memory slot. Clones share the same contents, so a second store built
/// from a clone sees what the first one wrote.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    slot: Arc<RwLock<Option<String>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with existing contents
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(contents.into()))),
        }
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn read(&self) -> Result<Option<String>> {
        Ok(self.slot.read().await.clone())
    }

    async fn write(&self, contents: &str) -> Result<()> {
        *self.slot.write().await = Some(contents.to_string());
        Ok(())
    }
}
