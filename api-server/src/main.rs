//! API server for the task list
//!
//! Serves the task store over a REST API. Tasks live in SQLite when the
//! database is available and in a JSON blob otherwise.

mod config;
mod routes;
mod state;

use axum::Router;
use std::net::SocketAddr;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasklist_core::store::{NoticeLevel, StoreNotice};

use crate::config::ServerConfig;
use crate::state::AppState;

fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::task::router())
        .merge(routes::debug::router())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Mirror store notices into the log
async fn log_notices(mut notices: broadcast::Receiver<StoreNotice>) {
    loop {
        match notices.recv().await {
            Ok(notice) => match notice.level {
                NoticeLevel::Success => tracing::debug!("Notice: {}", notice.message),
                NoticeLevel::Error => tracing::warn!("Notice: {}", notice.message),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Notice log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tasklist_server=debug,tasklist_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!("Using data directory: {:?}", config.data_dir);

    let state = AppState::from_config(&config);
    tokio::spawn(log_notices(state.task_store().subscribe()));

    // An errored store keeps serving; clients can retry initialization
    if let Err(e) = state.task_store().initialize().await {
        tracing::error!(error = %e, "Failed to load tasks at startup");
    }
    tracing::info!(
        backend = %state.task_store().backend_kind(),
        "Task store backend selected"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("REST API listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Failed to bind {}", addr);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
