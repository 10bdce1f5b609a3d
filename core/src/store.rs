//! Task store
//!
//! Owns the in-memory task list and mediates every read and write between
//! consumers and the persistence backend. Writes go to the backend first;
//! memory only changes once the backend has confirmed.

use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::adapter::{BackendKind, TaskBackend};
use crate::task::{
    filter_tasks, seed_tasks, NewTask, Task, TaskDraft, TaskFilter, TaskPatch, TaskStats,
};
use crate::{Error, Operation, Result};

/// Lifecycle of the store within a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum StoreStatus {
    Uninitialized,
    Initializing,
    Ready,
    /// Neither backend could be read. Initialization may be retried.
    Errored(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Short outcome message for the user, one per operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreNotice {
    pub level: NoticeLevel,
    pub message: String,
}

struct StoreState {
    status: StoreStatus,
    /// Newest `created_at` first
    tasks: Vec<Task>,
}

/// Current time at the precision timestamps are stored with
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A fresh `updated_at` that is strictly later than `previous`
fn next_stamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous + Duration::milliseconds(1))
}

/// State controller for the task list
pub struct TaskStore {
    backend: Arc<dyn TaskBackend>,
    state: RwLock<StoreState>,
    notices: broadcast::Sender<StoreNotice>,
    seed: bool,
}

impl TaskStore {
    /// Create an uninitialized store over `backend`
    pub fn new(backend: Arc<dyn TaskBackend>) -> Self {
        let (notices, _) = broadcast::channel(64);
        Self {
            backend,
            state: RwLock::new(StoreState {
                status: StoreStatus::Uninitialized,
                tasks: Vec::new(),
            }),
            notices,
            seed: true,
        }
    }

    /// Whether to insert the example tasks when the backend starts empty
    pub fn with_seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    /// Subscribe to operation notices
    pub fn subscribe(&self) -> broadcast::Receiver<StoreNotice> {
        self.notices.subscribe()
    }

    pub async fn status(&self) -> StoreStatus {
        self.state.read().await.status.clone()
    }

    /// Backend currently serving writes
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Snapshot of all tasks, newest first
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn get(&self, id: i64) -> Option<Task> {
        let state = self.state.read().await;
        state.tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Tasks matching `filter` and the free-text `search`, in list order
    pub async fn filtered(&self, filter: TaskFilter, search: &str) -> Vec<Task> {
        let state = self.state.read().await;
        filter_tasks(&state.tasks, filter, search)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn stats(&self, today: NaiveDate) -> TaskStats {
        let state = self.state.read().await;
        TaskStats::compute(&state.tasks, today)
    }

    /// Load tasks from the backend, seeding examples on first run.
    ///
    /// Can be called again after a failure to retry.
    pub async fn initialize(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            if state.status == StoreStatus::Initializing {
                return Err(Error::NotReady(
                    "Initialization already in progress".to_string(),
                ));
            }
            state.status = StoreStatus::Initializing;
        }

        match self.load().await {
            Ok(tasks) => {
                info!(
                    count = tasks.len(),
                    backend = %self.backend.kind(),
                    "Task store ready"
                );
                let mut state = self.state.write().await;
                state.tasks = tasks;
                state.status = StoreStatus::Ready;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Task store initialization failed");
                let mut state = self.state.write().await;
                state.tasks.clear();
                state.status = StoreStatus::Errored(e.user_message());
                drop(state);
                self.notify(NoticeLevel::Error, e.user_message());
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<Vec<Task>> {
        self.backend.ensure_schema().await?;
        let tasks = self.backend.load_all().await?;
        if !tasks.is_empty() || !self.seed {
            return Ok(tasks);
        }
        Ok(self.seed_examples().await)
    }

    /// Insert the seed set oldest first, prepending each confirmed task so
    /// the list ends up newest first. Stops at the first failed insert.
    async fn seed_examples(&self) -> Vec<Task> {
        let mut tasks = Vec::new();
        for new in seed_tasks().into_iter().rev() {
            match self.backend.insert(&new).await {
                Ok(id) => tasks.insert(0, Task::from_new(id, new)),
                Err(e) => {
                    warn!(error = %e, seeded = tasks.len(), "Seeding example tasks failed");
                    break;
                }
            }
        }
        debug!(count = tasks.len(), "Seeded example tasks");
        tasks
    }

    /// Add a task; it is prepended to the list once the backend assigns its id
    pub async fn add(&self, draft: TaskDraft) -> Result<Task> {
        self.ensure_ready().await?;
        draft.validate()?;

        let new = NewTask::stamped(draft, now());
        let id = self
            .backend
            .insert(&new)
            .await
            .map_err(|e| self.mutation_failed(Operation::Add, None, e))?;

        let task = Task::from_new(id, new);
        self.state.write().await.tasks.insert(0, task.clone());

        info!(task_id = id, backend = %self.backend.kind(), "Task added");
        self.notify(NoticeLevel::Success, Operation::Add.success_notice());
        Ok(task)
    }

    /// Merge `patch` into the task with `id` and refresh its `updated_at`
    pub async fn update(&self, id: i64, patch: TaskPatch) -> Result<Task> {
        self.apply_patch(Operation::Update, id, patch).await
    }

    /// Flip the completion flag. Returns `None` if no task has `id`.
    pub async fn toggle_complete(&self, id: i64) -> Result<Option<Task>> {
        self.ensure_ready().await?;
        let Some(current) = self.get(id).await else {
            debug!(task_id = id, "Toggle on unknown task ignored");
            return Ok(None);
        };
        let patch = TaskPatch::default().completed(!current.completed);
        self.apply_patch(Operation::Toggle, id, patch).await.map(Some)
    }

    /// Delete a task. Returns whether it was in the list.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        self.ensure_ready().await?;

        self.backend
            .delete(id)
            .await
            .map_err(|e| self.mutation_failed(Operation::Delete, Some(id), e))?;

        let removed = {
            let mut state = self.state.write().await;
            let before = state.tasks.len();
            state.tasks.retain(|t| t.id != id);
            state.tasks.len() != before
        };

        if removed {
            info!(task_id = id, "Task deleted");
            self.notify(NoticeLevel::Success, Operation::Delete.success_notice());
        } else {
            debug!(task_id = id, "Delete on unknown task");
        }
        Ok(removed)
    }

    async fn apply_patch(
        &self,
        operation: Operation,
        id: i64,
        mut patch: TaskPatch,
    ) -> Result<Task> {
        self.ensure_ready().await?;
        patch.validate()?;

        let previous = self.get(id).await.ok_or(Error::TaskNotFound(id))?;
        patch.updated_at = Some(next_stamp(previous.updated_at));

        self.backend
            .update(id, &patch)
            .await
            .map_err(|e| self.mutation_failed(operation, Some(id), e))?;

        let updated = {
            let mut state = self.state.write().await;
            let task = state
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(Error::TaskNotFound(id))?;
            patch.apply(task);
            task.clone()
        };

        info!(task_id = id, %operation, "Task updated");
        self.notify(NoticeLevel::Success, operation.success_notice());
        Ok(updated)
    }

    async fn ensure_ready(&self) -> Result<()> {
        match &self.state.read().await.status {
            StoreStatus::Ready => Ok(()),
            StoreStatus::Errored(msg) => Err(Error::NotReady(msg.clone())),
            other => Err(Error::NotReady(format!("{:?}", other))),
        }
    }

    fn mutation_failed(&self, operation: Operation, id: Option<i64>, err: Error) -> Error {
        error!(
            %operation,
            task_id = id,
            backend = %self.backend.kind(),
            error = %err,
            "Task mutation failed"
        );
        self.notify(NoticeLevel::Error, operation.failure_notice());
        Error::Mutation {
            operation,
            message: err.to_string(),
        }
    }

    fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        // No subscribers is fine
        let _ = self.notices.send(StoreNotice {
            level,
            message: message.into(),
        });
    }
}
