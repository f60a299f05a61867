//! # dockboard-web
//!
//! The dashboard's HTTP surface.
//!
//! | route | handler |
//! |---|---|
//! | `GET /` | HTML index |
//! | `GET /api/containers` | every container as JSON |
//! | `GET /api/container/{id}` | one container as JSON |
//! | `POST /api/container/{id}/start\|stop\|restart\|update` | lifecycle |
//! | `POST /api/container/{id}/regenerate-description` | fresh description |
//!
//! Core calls block on the runtime, so every handler runs them on tokio's
//! blocking pool.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod handlers;
pub mod page;
pub mod state;

use std::future::Future;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;

pub use state::AppState;

/// Builds the router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/containers", get(handlers::list_containers))
        .route("/api/container/{id}", get(handlers::get_container))
        .route("/api/container/{id}/start", post(handlers::start))
        .route("/api/container/{id}/stop", post(handlers::stop))
        .route("/api/container/{id}/restart", post(handlers::restart))
        .route("/api/container/{id}/update", post(handlers::update))
        .route(
            "/api/container/{id}/regenerate-description",
            post(handlers::regenerate_description),
        )
        .with_state(state)
}

/// Serves the dashboard on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error that stopped the server.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "dashboard listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
