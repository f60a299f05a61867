//! Runtime gateway abstraction.
//!
//! The dashboard never holds authoritative container state. Every request
//! goes through a [`RuntimeGateway`], which re-reads the runtime.

pub mod api;
pub mod cli;
#[cfg(any(test, feature = "testing"))]
pub mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use dockboard_common::config::{BackendKind, DashboardConfig};
use dockboard_common::error::Result;
use dockboard_common::types::{Container, ContainerId, PortBindings};

/// Everything needed to create a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name.
    pub name: String,
    /// Image reference to create from.
    pub image: String,
    /// Port bindings.
    pub port_bindings: PortBindings,
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    /// Volume binds in `source:target[:mode]` form.
    pub binds: Vec<String>,
    /// Container labels.
    pub labels: BTreeMap<String, String>,
}

/// Backend-independent access to a container runtime.
///
/// All calls block the current thread and are bounded in time by the
/// implementation. Failures are returned, never swallowed.
pub trait RuntimeGateway: Send + Sync {
    /// Short backend name used in logs.
    fn backend_name(&self) -> &'static str;

    /// Lists running containers, or all containers when `include_stopped`.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeUnavailable` if the runtime cannot be queried.
    fn list_containers(&self, include_stopped: bool) -> Result<Vec<Container>>;

    /// Looks up one container by full id, short id, or name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the runtime does not know the container.
    fn get_container(&self, id: &str) -> Result<Container>;

    /// Starts a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime refuses or cannot be reached.
    fn start(&self, id: &ContainerId) -> Result<()>;

    /// Stops a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime refuses or cannot be reached.
    fn stop(&self, id: &ContainerId) -> Result<()>;

    /// Restarts a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime refuses or cannot be reached.
    fn restart(&self, id: &ContainerId) -> Result<()>;

    /// Pulls an image by reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the pull fails or exceeds the pull timeout.
    fn pull_image(&self, reference: &str) -> Result<()>;

    /// Removes a stopped container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be removed.
    fn remove_container(&self, id: &ContainerId) -> Result<()>;

    /// Creates (but does not start) a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime rejects the container definition.
    fn create_container(&self, spec: &ContainerSpec) -> Result<Container>;
}

impl std::fmt::Debug for dyn RuntimeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RuntimeGateway({})", self.backend_name())
    }
}

/// Builds the gateway selected by the configuration.
///
/// # Errors
///
/// Returns an error if the chosen backend cannot be initialised (no
/// `docker` binary on `PATH`, or no reachable Engine API socket).
pub fn connect(config: &DashboardConfig) -> Result<Arc<dyn RuntimeGateway>> {
    let gateway: Arc<dyn RuntimeGateway> = match config.backend {
        BackendKind::Api => Arc::new(api::DockerApiGateway::connect(
            config.runtime_timeout,
            config.pull_timeout,
        )?),
        BackendKind::Cli => Arc::new(cli::DockerCliGateway::new(
            config.runtime_timeout,
            config.pull_timeout,
        )?),
    };
    tracing::info!(backend = gateway.backend_name(), "runtime gateway ready");
    Ok(gateway)
}
