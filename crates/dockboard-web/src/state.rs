//! Shared handler state.

use std::sync::Arc;

use dockboard_core::lifecycle::LifecycleController;
use dockboard_core::snapshot::SnapshotBuilder;

/// Services the handlers call into. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<Services>,
}

/// The core components behind the HTTP surface.
#[derive(Debug)]
pub struct Services {
    /// Snapshot and description queries.
    pub snapshots: SnapshotBuilder,
    /// Lifecycle operations.
    pub lifecycle: LifecycleController,
    /// Whether `GET /` lists stopped containers too.
    pub index_includes_stopped: bool,
}

impl AppState {
    /// Wraps the services for sharing across handlers.
    #[must_use]
    pub fn new(services: Services) -> Self {
        Self {
            inner: Arc::new(services),
        }
    }

    /// Shared handle to the services, for moving into blocking tasks.
    #[must_use]
    pub fn services(&self) -> Arc<Services> {
        Arc::clone(&self.inner)
    }
}
