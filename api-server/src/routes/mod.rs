//! Route handlers

pub mod debug;
pub mod health;
pub mod task;

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tasklist_core::Error;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map a core error to a status code and a user-facing message.
///
/// Backend detail has already been logged by the store and is not echoed.
pub fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
        Error::NotReady(_)
        | Error::CapabilityAbsent
        | Error::Initialization(_)
        | Error::Fallback(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    debug!(error = %err, status = status.as_u16(), "Request failed");
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
        }),
    )
}
