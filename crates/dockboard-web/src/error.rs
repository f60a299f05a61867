//! Error → response mapping.
//!
//! Listing endpoints answer `{"error": ...}`; action endpoints answer
//! `{"status": "error", "message": ...}`. Both use the status code of
//! [`status_for`].

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dockboard_common::error::DockboardError;

/// HTTP status for each error kind.
#[must_use]
pub const fn status_for(err: &DockboardError) -> StatusCode {
    match err {
        DockboardError::NotFound { .. } => StatusCode::NOT_FOUND,
        DockboardError::Validation { .. } => StatusCode::BAD_REQUEST,
        DockboardError::Busy { .. } => StatusCode::CONFLICT,
        DockboardError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
        DockboardError::RuntimeUnavailable { .. }
        | DockboardError::RecreateFailed { .. }
        | DockboardError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Failure of a query endpoint.
#[derive(Debug)]
pub struct QueryError(pub DockboardError);

impl From<DockboardError> for QueryError {
    fn from(err: DockboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "query failed");
        }
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Failure of an action endpoint.
#[derive(Debug)]
pub struct ActionError(pub DockboardError);

impl From<DockboardError> for ActionError {
    fn from(err: DockboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "action failed");
        } else {
            tracing::debug!(error = %self.0, "action rejected");
        }
        (
            status,
            Json(serde_json::json!({ "status": "error", "message": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Failure of the HTML index: plain text.
#[derive(Debug)]
pub struct PageError(pub String);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "index page failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", self.0)).into_response()
    }
}
