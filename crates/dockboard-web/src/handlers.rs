//! Route handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::response::Html;
use dockboard_common::error::{DockboardError, Result};
use dockboard_core::lifecycle::Action;
use dockboard_core::snapshot::ContainerSnapshot;
use serde::Serialize;

use crate::error::{ActionError, PageError, QueryError};
use crate::page;
use crate::state::AppState;

/// Body of a successful action.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    /// Always `success`.
    pub status: &'static str,
    /// Human-readable outcome.
    pub message: String,
    /// Short id of the recreated container (update only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_id: Option<String>,
    /// Freshly generated description (regenerate only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionResponse {
    fn success(message: String) -> Self {
        Self {
            status: "success",
            message,
            new_id: None,
            description: None,
        }
    }
}

/// Runs a blocking core call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DockboardError::runtime(format!("worker task failed: {e}")))?
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> std::result::Result<Html<String>, PageError> {
    let services = state.services();
    let include_stopped = services.index_includes_stopped;
    let generation_enabled = services.snapshots.descriptions().is_configured();
    let snapshots = blocking(move || services.snapshots.list(include_stopped))
        .await
        .map_err(|e| PageError(e.to_string()))?;
    page::render(&snapshots, include_stopped, generation_enabled)
        .map(Html)
        .map_err(PageError)
}

/// `GET /api/containers`
pub async fn list_containers(
    State(state): State<AppState>,
) -> std::result::Result<Json<Vec<ContainerSnapshot>>, QueryError> {
    let services = state.services();
    let snapshots = blocking(move || services.snapshots.list(true)).await?;
    Ok(Json(snapshots))
}

/// `GET /api/container/{id}`
pub async fn get_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ContainerSnapshot>, QueryError> {
    let services = state.services();
    let snapshot = blocking(move || services.snapshots.snapshot(&id)).await?;
    Ok(Json(snapshot))
}

async fn run_action(
    state: AppState,
    id: String,
    action: Action,
) -> std::result::Result<Json<ActionResponse>, ActionError> {
    let services = state.services();
    let name = blocking(move || services.lifecycle.run(action, &id)).await?;
    Ok(Json(ActionResponse::success(format!(
        "Container {name} {}",
        action.past_tense()
    ))))
}

/// `POST /api/container/{id}/start`
pub async fn start(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ActionResponse>, ActionError> {
    run_action(state, id, Action::Start).await
}

/// `POST /api/container/{id}/stop`
pub async fn stop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ActionResponse>, ActionError> {
    run_action(state, id, Action::Stop).await
}

/// `POST /api/container/{id}/restart`
pub async fn restart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ActionResponse>, ActionError> {
    run_action(state, id, Action::Restart).await
}

/// `POST /api/container/{id}/update`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ActionResponse>, ActionError> {
    let services = state.services();
    let outcome = blocking(move || services.lifecycle.update(&id)).await?;
    let mut response = ActionResponse::success(format!("Container {} updated", outcome.name));
    response.new_id = Some(outcome.new_id);
    Ok(Json(response))
}

/// `POST /api/container/{id}/regenerate-description`
pub async fn regenerate_description(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> std::result::Result<Json<ActionResponse>, ActionError> {
    let services = state.services();
    let description = blocking(move || services.snapshots.regenerate_description(&id)).await?;
    let mut response = ActionResponse::success(
        "Description regenerated (will be saved on next container recreation)".to_string(),
    );
    response.description = Some(description.text);
    Ok(Json(response))
}
