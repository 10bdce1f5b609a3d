//! Fallback backend over the blob store
//!
//! The in-memory task list is the source of truth; every mutation writes the
//! whole list back to the blob so a reload can restore it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{BackendKind, TaskBackend};
use crate::blob::BlobStore;
use crate::task::{NewTask, Task, TaskPatch};
use crate::{Error, Result};

/// Task backend that keeps everything in one serialized blob
pub struct FallbackBackend {
    blob: Arc<dyn BlobStore>,
    /// `None` until the blob has been read
    tasks: RwLock<Option<Vec<Task>>>,
}

impl FallbackBackend {
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self {
            blob,
            tasks: RwLock::new(None),
        }
    }

    async fn read_blob(&self) -> Result<Vec<Task>> {
        let content = self
            .blob
            .read()
            .await
            .map_err(|e| Error::Fallback(format!("Failed to read task blob: {}", e)))?;
        match content {
            Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
                .map_err(|e| Error::Fallback(format!("Failed to parse task blob: {}", e))),
            _ => Ok(Vec::new()),
        }
    }

    async fn ensure_loaded<'a>(
        &self,
        slot: &'a mut Option<Vec<Task>>,
    ) -> Result<&'a mut Vec<Task>> {
        if slot.is_none() {
            let tasks = self.read_blob().await?;
            debug!(count = tasks.len(), "Loaded tasks from fallback blob");
            *slot = Some(tasks);
        }
        Ok(slot.get_or_insert_with(Vec::new))
    }

    /// Write `tasks` through to the blob
    async fn persist(&self, tasks: &[Task]) -> Result<()> {
        let content = serde_json::to_string(tasks)?;
        self.blob
            .write(&content)
            .await
            .map_err(|e| Error::Fallback(format!("Failed to write task blob: {}", e)))
    }

    /// Apply `change` to a copy of the list, persist it, then commit it.
    /// Memory is left untouched when the write fails.
    async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> Option<T>,
        T: Default,
    {
        let mut slot = self.tasks.write().await;
        let tasks = self.ensure_loaded(&mut slot).await?;

        let mut next = tasks.clone();
        let Some(result) = change(&mut next) else {
            return Ok(T::default());
        };
        self.persist(&next).await?;
        *tasks = next;
        Ok(result)
    }
}

#[async_trait]
impl TaskBackend for FallbackBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Fallback
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Task>> {
        let mut slot = self.tasks.write().await;
        let mut tasks = self.ensure_loaded(&mut slot).await?.clone();
        // Sort by created_at descending (newest first)
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tasks)
    }

    async fn insert(&self, task: &NewTask) -> Result<i64> {
        self.mutate(|tasks| {
            let id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
            tasks.push(Task::from_new(id, task.clone()));
            Some(id)
        })
        .await
    }

    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<()> {
        self.mutate(|tasks| {
            let task = tasks.iter_mut().find(|t| t.id == id)?;
            patch.apply(task);
            Some(())
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.mutate(|tasks| {
            let index = tasks.iter().position(|t| t.id == id)?;
            tasks.remove(index);
            Some(())
        })
        .await
    }
}
