//! Backend diagnostics and manual re-initialization

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tasklist_core::adapter::{BackendKind, BridgeProbe};
use tasklist_core::store::StoreStatus;
use tracing::info;

use super::{api_error, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendReport {
    pub active_backend: BackendKind,
    pub bridge_configured: bool,
    pub degrade_reason: Option<String>,
    pub probe: BridgeProbe,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    pub status: StoreStatus,
    pub backend: BackendKind,
    pub count: usize,
}

/// GET /api/debug/backend - Which backend is active and why
async fn backend_report(State(state): State<AppState>) -> Json<BackendReport> {
    let adapter = state.adapter();
    Json(BackendReport {
        active_backend: state.task_store().backend_kind(),
        bridge_configured: adapter.has_bridge(),
        degrade_reason: adapter.degrade_reason().map(str::to_string),
        probe: adapter.probe().await,
    })
}

/// POST /api/store/initialize - Retry loading tasks
async fn initialize_store(
    State(state): State<AppState>,
) -> Result<Json<InitializeResponse>, ApiError> {
    let store = state.task_store();
    store.initialize().await.map_err(api_error)?;
    info!("Task store re-initialized on request");

    Ok(Json(InitializeResponse {
        status: store.status().await,
        backend: store.backend_kind(),
        count: store.tasks().await.len(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/debug/backend", get(backend_report))
        .route("/api/store/initialize", post(initialize_store))
}
