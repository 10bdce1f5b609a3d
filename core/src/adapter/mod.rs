//! Persistence adapter
//!
//! A uniform CRUD contract over tasks with two implementations: the
//! structured backend reached through the host bridge, and the fallback
//! blob store. [`PersistenceAdapter`] picks between them once per session.

mod fallback;
mod structured;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

use crate::blob::BlobStore;
use crate::bridge::SqlBridge;
use crate::task::{NewTask, Task, TaskPatch};
use crate::{Error, Result};

pub use fallback::FallbackBackend;
pub use structured::{StructuredBackend, TABLE_NAME};

/// Which backend is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Structured,
    Fallback,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend interface for task CRUD operations
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Backend currently serving requests
    fn kind(&self) -> BackendKind;

    /// Make sure the task table exists
    async fn ensure_schema(&self) -> Result<()>;

    /// All stored tasks, newest `created_at` first
    async fn load_all(&self) -> Result<Vec<Task>>;

    /// Store a new task and return the id the backend assigned
    async fn insert(&self, task: &NewTask) -> Result<i64>;

    /// Persist only the fields present in `patch`
    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<()>;

    /// Remove a task. Missing ids are not an error.
    async fn delete(&self, id: i64) -> Result<()>;
}

/// Result of a diagnostic round trip to the host bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum BridgeProbe {
    Available,
    Unavailable(String),
}

/// Chooses between the structured and fallback backends.
///
/// The structured backend is tried first. If it is absent, or fails to
/// load during initialization, the adapter switches to the fallback for
/// the rest of its life. Mutation failures are returned to the caller and
/// never trigger the switch.
pub struct PersistenceAdapter {
    structured: Option<StructuredBackend>,
    fallback: FallbackBackend,
    /// Set once when the adapter degrades to the fallback
    degraded: OnceLock<String>,
}

impl PersistenceAdapter {
    pub fn new(bridge: Option<Arc<dyn SqlBridge>>, blob: Arc<dyn BlobStore>) -> Self {
        Self {
            structured: bridge.map(StructuredBackend::new),
            fallback: FallbackBackend::new(blob),
            degraded: OnceLock::new(),
        }
    }

    /// Why the adapter switched to the fallback, if it did
    pub fn degrade_reason(&self) -> Option<&str> {
        self.degraded.get().map(String::as_str)
    }

    /// Whether a host bridge was supplied at all
    pub fn has_bridge(&self) -> bool {
        self.structured.is_some()
    }

    /// Check whether the host bridge answers a trivial query.
    ///
    /// Purely diagnostic: the active backend is not changed.
    pub async fn probe(&self) -> BridgeProbe {
        let Some(structured) = &self.structured else {
            return BridgeProbe::Unavailable(Error::CapabilityAbsent.to_string());
        };
        match structured.probe().await {
            Ok(()) => BridgeProbe::Available,
            Err(e) => {
                warn!(error = %e, "Bridge probe failed");
                BridgeProbe::Unavailable(e.to_string())
            }
        }
    }

    fn degrade(&self, reason: String) {
        if self.degraded.set(reason).is_ok() {
            info!(
                reason = self.degrade_reason().unwrap_or_default(),
                "Switched to fallback backend for this session"
            );
        }
    }

    /// The structured backend, unless absent or abandoned
    fn active_structured(&self) -> Option<&StructuredBackend> {
        if self.degraded.get().is_some() {
            return None;
        }
        self.structured.as_ref()
    }

    fn active(&self) -> &dyn TaskBackend {
        match self.active_structured() {
            Some(structured) => structured as &dyn TaskBackend,
            None => &self.fallback,
        }
    }
}

#[async_trait]
impl TaskBackend for PersistenceAdapter {
    fn kind(&self) -> BackendKind {
        self.active().kind()
    }

    async fn ensure_schema(&self) -> Result<()> {
        if self.structured.is_none() {
            self.degrade(Error::CapabilityAbsent.to_string());
        }
        let Some(structured) = self.active_structured() else {
            return self.fallback.ensure_schema().await;
        };

        // Existing tables make some hosts fail here; loading decides
        if let Err(e) = structured.ensure_schema().await {
            warn!(error = %e, "Schema creation failed, continuing");
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Task>> {
        if self.structured.is_none() {
            self.degrade(Error::CapabilityAbsent.to_string());
        }
        if let Some(structured) = self.active_structured() {
            match structured.load_all().await {
                Ok(tasks) => return Ok(tasks),
                Err(e) => {
                    error!(error = %e, "Structured backend failed to load tasks");
                    self.degrade(Error::Initialization(e.to_string()).to_string());
                }
            }
        }
        self.fallback.load_all().await
    }

    async fn insert(&self, task: &NewTask) -> Result<i64> {
        self.active().insert(task).await
    }

    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<()> {
        self.active().update(id, patch).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.active().delete(id).await
    }
}
