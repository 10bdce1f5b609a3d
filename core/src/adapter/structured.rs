//! Structured backend over the host database bridge

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{BackendKind, TaskBackend};
use crate::bridge::{Record, SqlBridge};
use crate::task::{NewTask, Task, TaskPatch, TaskPriority};
use crate::{Error, Result};

pub const TABLE_NAME: &str = "todos";

const SCHEMA: &str = "
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT,
    completed BOOLEAN DEFAULT 0,
    priority TEXT DEFAULT 'medium',
    category TEXT,
    dueDate TEXT,
    createdAt TEXT NOT NULL,
    updatedAt TEXT NOT NULL
";

const LOAD_ALL_QUERY: &str = "SELECT * FROM todos ORDER BY createdAt DESC";

/// Task backend that talks to the host bridge
pub struct StructuredBackend {
    bridge: Arc<dyn SqlBridge>,
}

impl StructuredBackend {
    pub fn new(bridge: Arc<dyn SqlBridge>) -> Self {
        Self { bridge }
    }

    /// Run a trivial query to check the bridge answers at all
    pub async fn probe(&self) -> Result<()> {
        self.bridge.query_data("SELECT 1 AS test", Vec::new()).await?;
        Ok(())
    }
}

/// Timestamps are stored at millisecond precision so text order is time order
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn encode_bool(value: bool) -> Value {
    json!(if value { 1 } else { 0 })
}

fn encode_optional(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

fn new_task_record(task: &NewTask) -> Record {
    let mut record = Record::new();
    record.insert("title".into(), json!(task.title));
    record.insert("description".into(), encode_optional(task.description.clone()));
    record.insert("completed".into(), encode_bool(task.completed));
    record.insert("priority".into(), json!(task.priority.as_str()));
    record.insert("category".into(), encode_optional(task.category.clone()));
    record.insert(
        "dueDate".into(),
        encode_optional(task.due_date.as_ref().map(format_date)),
    );
    record.insert("createdAt".into(), json!(format_timestamp(&task.created_at)));
    record.insert("updatedAt".into(), json!(format_timestamp(&task.updated_at)));
    record
}

fn patch_record(patch: &TaskPatch) -> Record {
    let mut record = Record::new();
    if let Some(title) = &patch.title {
        record.insert("title".into(), json!(title));
    }
    if let Some(description) = &patch.description {
        record.insert("description".into(), encode_optional(description.clone()));
    }
    if let Some(completed) = patch.completed {
        record.insert("completed".into(), encode_bool(completed));
    }
    if let Some(priority) = patch.priority {
        record.insert("priority".into(), json!(priority.as_str()));
    }
    if let Some(category) = &patch.category {
        record.insert("category".into(), encode_optional(category.clone()));
    }
    if let Some(due_date) = &patch.due_date {
        record.insert(
            "dueDate".into(),
            encode_optional(due_date.as_ref().map(format_date)),
        );
    }
    if let Some(updated_at) = &patch.updated_at {
        record.insert("updatedAt".into(), json!(format_timestamp(updated_at)));
    }
    record
}

fn id_filter(id: i64) -> Record {
    let mut filter = Record::new();
    filter.insert("id".into(), json!(id));
    filter
}

/// Decode the stored 0/1 flag. Hosts have been seen returning integers,
/// booleans and numeric strings for the same column.
fn decode_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "true"),
        _ => false,
    }
}

fn decode_id(value: Option<&Value>) -> Result<i64> {
    let id = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| Error::Bridge(format!("Row has no usable id: {:?}", value)))
}

fn decode_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

fn decode_timestamp(row: &Record, column: &str) -> Result<DateTime<Utc>> {
    let raw = decode_text(row.get(column))
        .ok_or_else(|| Error::Bridge(format!("Row is missing {}", column)))?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Bridge(format!("Bad {} {:?}: {}", column, raw, e)))
}

fn task_from_row(row: &Record) -> Result<Task> {
    let id = decode_id(row.get("id"))?;
    let title = decode_text(row.get("title"))
        .ok_or_else(|| Error::Bridge(format!("Row {} has no title", id)))?;

    let priority = match decode_text(row.get("priority")) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(task_id = id, priority = %raw, "Unknown stored priority, using default");
            TaskPriority::default()
        }),
        None => TaskPriority::default(),
    };

    let due_date = decode_text(row.get("dueDate")).and_then(|raw| {
        let date = raw.get(..10).unwrap_or(raw.as_str());
        match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                warn!(task_id = id, due_date = %raw, "Unreadable stored due date, dropping it");
                None
            }
        }
    });

    Ok(Task {
        id,
        title,
        description: decode_text(row.get("description")),
        completed: decode_bool(row.get("completed")),
        priority,
        category: decode_text(row.get("category")),
        due_date,
        created_at: decode_timestamp(row, "createdAt")?,
        updated_at: decode_timestamp(row, "updatedAt")?,
    })
}

#[async_trait]
impl TaskBackend for StructuredBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Structured
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.bridge.create_table(TABLE_NAME, SCHEMA).await
    }

    async fn load_all(&self) -> Result<Vec<Task>> {
        let rows = self.bridge.query_data(LOAD_ALL_QUERY, Vec::new()).await?;
        let tasks: Vec<Task> = rows
            .iter()
            .filter_map(|row| match task_from_row(row) {
                Ok(task) => Some(task),
                Err(e) => {
                    let task_id = decode_id(row.get("id")).ok();
                    warn!(task_id, error = %e, "Skipping unreadable task row");
                    None
                }
            })
            .collect();
        debug!(
            count = tasks.len(),
            skipped = rows.len() - tasks.len(),
            "Loaded tasks from structured backend"
        );
        Ok(tasks)
    }

    async fn insert(&self, task: &NewTask) -> Result<i64> {
        self.bridge
            .insert_data(TABLE_NAME, new_task_record(task))
            .await
    }

    async fn update(&self, id: i64, patch: &TaskPatch) -> Result<()> {
        let data = patch_record(patch);
        if data.is_empty() {
            return Ok(());
        }
        self.bridge.update_data(TABLE_NAME, data, id_filter(id)).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.bridge.delete_data(TABLE_NAME, id_filter(id)).await
    }
}
