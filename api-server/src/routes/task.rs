//! Task API endpoints
//!
//! RESTful API over the task store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use tasklist_core::task::{Task, TaskDraft, TaskFilter, TaskPatch, TaskStats, CATEGORIES};
use tasklist_core::Error;

use super::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// Reference date for the overdue count, defaults to today (UTC)
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - List tasks, optionally filtered and searched
async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => raw.parse::<TaskFilter>().map_err(api_error)?,
        None => TaskFilter::All,
    };
    let search = query.search.unwrap_or_default();

    Ok(Json(state.task_store().filtered(filter, &search).await))
}

/// POST /api/tasks - Create a new task
async fn create_task(
    State(state): State<AppState>,
    Json(draft): Json<TaskDraft>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let created = state.task_store().add(draft).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/tasks/{id} - Get a single task
async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    state
        .task_store()
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| api_error(Error::TaskNotFound(id)))
}

/// PATCH /api/tasks/{id} - Update the supplied fields of a task
async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let updated = state
        .task_store()
        .update(id, patch)
        .await
        .map_err(api_error)?;
    Ok(Json(updated))
}

/// POST /api/tasks/{id}/toggle - Flip the completion flag
async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    state
        .task_store()
        .toggle_complete(id)
        .await
        .map_err(api_error)?
        .map(Json)
        .ok_or_else(|| api_error(Error::TaskNotFound(id)))
}

/// DELETE /api/tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = state.task_store().delete(id).await.map_err(api_error)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(Error::TaskNotFound(id)))
    }
}

/// GET /api/stats - Summary counts
async fn task_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Json<TaskStats> {
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    Json(state.task_store().stats(today).await)
}

/// GET /api/categories - Suggested categories
async fn list_categories() -> Json<Vec<&'static str>> {
    Json(CATEGORIES.to_vec())
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/api/tasks/{id}/toggle", post(toggle_task))
        .route("/api/stats", get(task_stats))
        .route("/api/categories", get(list_categories))
}
