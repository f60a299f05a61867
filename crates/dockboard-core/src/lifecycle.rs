//! Lifecycle operations against the runtime.
//!
//! Every operation resolves the container first, then holds its canonical
//! id in [`KeyedLocks`] until it finishes. The update sequence is:
//!
//! 1. pick the image from the container's first tag
//! 2. pull it (failure leaves the container untouched)
//! 3. capture ports, environment, binds, and the description label
//! 4. stop, if a process is live
//! 5. remove
//! 6. create under the same name and start
//!
//! Anything failing in step 6 is [`DockboardError::RecreateFailed`]: the old
//! container is already gone.

use std::collections::BTreeMap;
use std::sync::Arc;

use dockboard_common::constants::DESCRIPTION_LABEL;
use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::{Container, ContainerId};
use dockboard_runtime::gateway::{ContainerSpec, RuntimeGateway};
use serde::{Deserialize, Serialize};

use crate::lock::KeyedLocks;
use crate::pending::PendingLabels;

/// Simple single-call lifecycle actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start a created or exited container.
    Start,
    /// Stop a running container.
    Stop,
    /// Restart a container.
    Restart,
}

impl Action {
    /// Past tense used in user-facing messages.
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
        }
    }
}

/// Result of a successful update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    /// Name shared by the old and the new container.
    pub name: String,
    /// Image reference that was pulled.
    pub image: String,
    /// Short id of the new container.
    pub new_id: String,
}

/// Executes lifecycle operations, one at a time per container.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    gateway: Arc<dyn RuntimeGateway>,
    locks: KeyedLocks,
    pending: Arc<PendingLabels>,
}

impl LifecycleController {
    /// Creates a controller writing pending descriptions on recreate.
    #[must_use]
    pub fn new(gateway: Arc<dyn RuntimeGateway>, pending: Arc<PendingLabels>) -> Self {
        Self {
            gateway,
            locks: KeyedLocks::new(),
            pending,
        }
    }

    /// Lock map, exposed for inspection.
    #[must_use]
    pub const fn locks(&self) -> &KeyedLocks {
        &self.locks
    }

    /// Starts the container and returns its name.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Busy`, or the runtime's refusal.
    pub fn start(&self, id: &str) -> Result<String> {
        self.run(Action::Start, id)
    }

    /// Stops the container and returns its name.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Busy`, or the runtime's refusal.
    pub fn stop(&self, id: &str) -> Result<String> {
        self.run(Action::Stop, id)
    }

    /// Restarts the container and returns its name.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Busy`, or the runtime's refusal.
    pub fn restart(&self, id: &str) -> Result<String> {
        self.run(Action::Restart, id)
    }

    /// Runs a single-call action and returns the container name.
    ///
    /// # Errors
    ///
    /// `NotFound`, `Busy`, or the runtime's refusal.
    pub fn run(&self, action: Action, id: &str) -> Result<String> {
        let container = self.gateway.get_container(id)?;
        let _guard = self.locks.try_acquire(container.id.as_str())?;
        match action {
            Action::Start => self.gateway.start(&container.id)?,
            Action::Stop => self.gateway.stop(&container.id)?,
            Action::Restart => self.gateway.restart(&container.id)?,
        }
        tracing::info!(id = %container.id.short(), name = %container.name, "container {}", action.past_tense());
        Ok(container.name)
    }

    /// Pulls the container's image and recreates it with the same name and
    /// configuration.
    ///
    /// # Errors
    ///
    /// - `Validation` if the container's image has no tag (nothing mutated)
    /// - any pull, stop, or remove failure (container may still exist)
    /// - `RecreateFailed` if the new container cannot be created or started
    pub fn update(&self, id: &str) -> Result<UpdateOutcome> {
        let container = self.gateway.get_container(id)?;
        let _guard = self.locks.try_acquire(container.id.as_str())?;

        let image = container
            .primary_tag()
            .ok_or_else(|| DockboardError::Validation {
                message: "Cannot update container without image tag".into(),
            })?
            .to_string();

        tracing::info!(name = %container.name, image = %image, "update: pulling image");
        self.gateway.pull_image(&image)?;

        let spec = self.recreate_spec(&container, &image);

        if container.status.is_active() {
            tracing::info!(name = %container.name, "update: stopping old container");
            self.gateway.stop(&container.id)?;
        }
        tracing::info!(name = %container.name, "update: removing old container");
        self.gateway.remove_container(&container.id)?;

        let new_id = self.recreate(&spec).map_err(|e| {
            tracing::error!(name = %spec.name, error = %e, "update: recreate failed after removal");
            DockboardError::RecreateFailed {
                name: spec.name.clone(),
                message: e.to_string(),
            }
        })?;

        // The label now lives on the container.
        let _ = self.pending.take(&spec.name);
        tracing::info!(name = %spec.name, new_id = %new_id.short(), "container updated");
        Ok(UpdateOutcome {
            name: spec.name,
            image,
            new_id: new_id.short().to_string(),
        })
    }

    fn recreate_spec(&self, container: &Container, image: &str) -> ContainerSpec {
        let description = self
            .pending
            .peek(&container.name)
            .or_else(|| container.label(DESCRIPTION_LABEL).map(ToString::to_string));
        let mut labels = BTreeMap::new();
        if let Some(description) = description {
            let _ = labels.insert(DESCRIPTION_LABEL.to_string(), description);
        }
        ContainerSpec {
            name: container.name.clone(),
            image: image.to_string(),
            port_bindings: container.config.port_bindings.clone(),
            env: container.config.env.clone(),
            binds: container.config.binds.clone(),
            labels,
        }
    }

    fn recreate(&self, spec: &ContainerSpec) -> Result<ContainerId> {
        let created = self.gateway.create_container(spec)?;
        self.gateway.start(&created.id)?;
        Ok(created.id)
    }
}

#[cfg(test)]
mod tests {
    use dockboard_common::types::{ContainerStatus, PortBindings, RecreateConfig};
    use dockboard_runtime::gateway::memory::{InMemoryGateway, Operation};

    use super::*;

    fn container(tags: &[&str], status: ContainerStatus) -> Container {
        Container {
            id: ContainerId::new("1111111111111111aaaa"),
            name: "web".into(),
            image_tags: tags.iter().map(ToString::to_string).collect(),
            status,
            created: None,
            ports: PortBindings::new(),
            labels: BTreeMap::new(),
            state: serde_json::Value::Null,
            config: RecreateConfig {
                env: vec!["A=1".into()],
                ..RecreateConfig::default()
            },
        }
    }

    fn controller(gateway: &Arc<InMemoryGateway>) -> LifecycleController {
        let gateway: Arc<dyn RuntimeGateway> = gateway.clone();
        LifecycleController::new(gateway, Arc::new(PendingLabels::new()))
    }

    #[test]
    fn start_returns_the_name() {
        let gw = Arc::new(InMemoryGateway::with_containers([container(&["nginx"], ContainerStatus::Exited)]));
        assert_eq!(controller(&gw).start("1111").unwrap(), "web");
        assert_eq!(gw.by_name("web").unwrap().status, ContainerStatus::Running);
    }

    #[test]
    fn unknown_container_is_not_found() {
        let gw = Arc::new(InMemoryGateway::new());
        assert!(matches!(
            controller(&gw).stop("ghost"),
            Err(DockboardError::NotFound { .. })
        ));
    }

    #[test]
    fn untagged_update_mutates_nothing() {
        let gw = Arc::new(InMemoryGateway::with_containers([container(&[], ContainerStatus::Running)]));
        let err = controller(&gw).update("web").unwrap_err();
        assert_eq!(err.to_string(), "Cannot update container without image tag");
        assert!(gw.journal().is_empty());
    }

    #[test]
    fn failed_pull_leaves_container_untouched() {
        let gw = Arc::new(InMemoryGateway::with_containers([container(&["nginx"], ContainerStatus::Running)]));
        gw.fail(Operation::Pull, "manifest unknown");
        let err = controller(&gw).update("web").unwrap_err();
        assert!(matches!(err, DockboardError::RuntimeUnavailable { .. }));
        assert_eq!(gw.calls(Operation::Stop), 0);
        assert_eq!(gw.calls(Operation::Remove), 0);
        assert_eq!(gw.by_name("web").unwrap().status, ContainerStatus::Running);
    }

    #[test]
    fn stopped_container_is_not_stopped_again() {
        let gw = Arc::new(InMemoryGateway::with_containers([container(&["nginx"], ContainerStatus::Exited)]));
        let _ = controller(&gw).update("web").unwrap();
        assert_eq!(gw.calls(Operation::Stop), 0);
        assert_eq!(gw.calls(Operation::Remove), 1);
    }

    #[test]
    fn create_failure_is_recreate_failed() {
        let gw = Arc::new(InMemoryGateway::with_containers([container(&["nginx"], ContainerStatus::Running)]));
        gw.fail(Operation::Create, "port is already allocated");
        let err = controller(&gw).update("web").unwrap_err();
        assert!(matches!(err, DockboardError::RecreateFailed { .. }));
        assert!(!err.is_retryable());
        assert!(gw.by_name("web").is_none());
    }

    #[test]
    fn lock_is_released_after_failure() {
        let gw = Arc::new(InMemoryGateway::with_containers([container(&["nginx"], ContainerStatus::Running)]));
        gw.fail(Operation::Restart, "daemon hiccup");
        let ctl = controller(&gw);
        assert!(ctl.restart("web").is_err());
        assert_eq!(ctl.locks().held_count(), 0);
    }

    #[test]
    fn pending_description_is_written_on_recreate() {
        let gw = Arc::new(InMemoryGateway::with_containers([container(&["nginx"], ContainerStatus::Running)]));
        let pending = Arc::new(PendingLabels::new());
        pending.record("web", "Serves the landing page.");
        let gateway: Arc<dyn RuntimeGateway> = gw.clone();
        let ctl = LifecycleController::new(gateway, Arc::clone(&pending));

        let _ = ctl.update("web").unwrap();
        let recreated = gw.by_name("web").unwrap();
        assert_eq!(recreated.label(DESCRIPTION_LABEL), Some("Serves the landing page."));
        assert!(pending.is_empty());
    }
}
