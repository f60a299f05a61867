//! In-process runtime used by tests and demos.
//!
//! Models the parts of runtime behaviour the dashboard relies on: name
//! uniqueness, lookup by id prefix or name, refusal to remove a running
//! container. Failures can be injected per operation, and an artificial
//! latency can be added to mutating calls so overlapping requests can be
//! observed.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::{Container, ContainerId, ContainerStatus, RecreateConfig};

use super::{ContainerSpec, RuntimeGateway};

/// Gateway operations, for failure injection and the call journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `list_containers`.
    List,
    /// `get_container`.
    Get,
    /// `start`.
    Start,
    /// `stop`.
    Stop,
    /// `restart`.
    Restart,
    /// `pull_image`.
    Pull,
    /// `remove_container`.
    Remove,
    /// `create_container`.
    Create,
}

#[derive(Debug, Default)]
struct MemoryState {
    containers: Vec<Container>,
    failures: HashMap<Operation, String>,
    journal: Vec<(Operation, String)>,
    latency: Duration,
}

/// Runtime kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<MemoryState>,
}

impl InMemoryGateway {
    /// Creates an empty runtime.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runtime holding `containers`.
    #[must_use]
    pub fn with_containers(containers: impl IntoIterator<Item = Container>) -> Self {
        let gateway = Self::new();
        for container in containers {
            gateway.insert(container);
        }
        gateway
    }

    /// Adds or replaces a container.
    pub fn insert(&self, container: Container) {
        if let Ok(mut state) = self.state.lock() {
            state.containers.retain(|c| c.id != container.id);
            state.containers.push(container);
        }
    }

    /// Makes every subsequent call of `op` fail with `message`.
    pub fn fail(&self, op: Operation, message: impl Into<String>) {
        if let Ok(mut state) = self.state.lock() {
            let _ = state.failures.insert(op, message.into());
        }
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.clear();
        }
    }

    /// Delays every mutating call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.latency = latency;
        }
    }

    /// Mutating calls performed so far, with their subject.
    #[must_use]
    pub fn journal(&self) -> Vec<(Operation, String)> {
        self.state
            .lock()
            .map(|s| s.journal.clone())
            .unwrap_or_default()
    }

    /// Number of journal entries for `op`.
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.journal().iter().filter(|(o, _)| *o == op).count()
    }

    /// Current state of the container named `name`.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Container> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.containers.iter().find(|c| c.name == name).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| DockboardError::runtime("in-memory runtime state poisoned"))
    }

    /// Sleeps for the configured latency, then records the call and checks
    /// for an injected failure.
    fn mutate(&self, op: Operation, subject: &str) -> Result<MutexGuard<'_, MemoryState>> {
        let latency = self.lock()?.latency;
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }
        let mut state = self.lock()?;
        state.journal.push((op, subject.to_string()));
        check_failure(&state, op)?;
        Ok(state)
    }

    fn transition(&self, op: Operation, id: &ContainerId, to: ContainerStatus) -> Result<()> {
        let mut state = self.mutate(op, id.as_str())?;
        let container = find_mut(&mut state.containers, id.as_str())?;
        container.status = to;
        container.state = serde_json::json!({
            "Status": to.as_str(),
            "Running": to == ContainerStatus::Running,
        });
        Ok(())
    }
}

impl RuntimeGateway for InMemoryGateway {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn list_containers(&self, include_stopped: bool) -> Result<Vec<Container>> {
        let state = self.lock()?;
        check_failure(&state, Operation::List)?;
        Ok(state
            .containers
            .iter()
            .filter(|c| include_stopped || c.status == ContainerStatus::Running)
            .cloned()
            .collect())
    }

    fn get_container(&self, id: &str) -> Result<Container> {
        let state = self.lock()?;
        check_failure(&state, Operation::Get)?;
        find(&state.containers, id).cloned()
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        self.transition(Operation::Start, id, ContainerStatus::Running)
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        self.transition(Operation::Stop, id, ContainerStatus::Exited)
    }

    fn restart(&self, id: &ContainerId) -> Result<()> {
        self.transition(Operation::Restart, id, ContainerStatus::Running)
    }

    fn pull_image(&self, reference: &str) -> Result<()> {
        let _state = self.mutate(Operation::Pull, reference)?;
        Ok(())
    }

    fn remove_container(&self, id: &ContainerId) -> Result<()> {
        let mut state = self.mutate(Operation::Remove, id.as_str())?;
        let container = find(&state.containers, id.as_str())?;
        if container.status.is_active() {
            return Err(DockboardError::Validation {
                message: format!(
                    "You cannot remove a {} container {}. Stop the container before attempting removal",
                    container.status,
                    id
                ),
            });
        }
        let target = container.id.clone();
        state.containers.retain(|c| c.id != target);
        Ok(())
    }

    fn create_container(&self, spec: &ContainerSpec) -> Result<Container> {
        let mut state = self.mutate(Operation::Create, &spec.name)?;
        if state.containers.iter().any(|c| c.name == spec.name) {
            return Err(DockboardError::Validation {
                message: format!(
                    "Conflict. The container name \"/{}\" is already in use",
                    spec.name
                ),
            });
        }
        let container = Container {
            id: generate_id(),
            name: spec.name.clone(),
            image_tags: vec![spec.image.clone()],
            status: ContainerStatus::Created,
            created: None,
            ports: spec.port_bindings.clone(),
            labels: spec.labels.clone(),
            state: serde_json::json!({ "Status": "created", "Running": false }),
            config: RecreateConfig {
                port_bindings: spec.port_bindings.clone(),
                env: spec.env.clone(),
                binds: spec.binds.clone(),
            },
        };
        state.containers.push(container.clone());
        Ok(container)
    }
}

fn check_failure(state: &MemoryState, op: Operation) -> Result<()> {
    match state.failures.get(&op) {
        Some(message) => Err(DockboardError::runtime(message.clone())),
        None => Ok(()),
    }
}

/// Resolves an exact id, a unique id prefix, or a name.
fn position(containers: &[Container], id: &str) -> Result<usize> {
    if let Some(i) = containers
        .iter()
        .position(|c| c.id.as_str() == id || c.name == id)
    {
        return Ok(i);
    }
    let mut prefixed = containers
        .iter()
        .enumerate()
        .filter(|(_, c)| !id.is_empty() && c.id.as_str().starts_with(id));
    match (prefixed.next(), prefixed.next()) {
        (Some((i, _)), None) => Ok(i),
        (Some(_), Some(_)) => Err(DockboardError::Validation {
            message: format!("multiple containers match id prefix {id}"),
        }),
        _ => Err(DockboardError::container_not_found(id)),
    }
}

fn find<'a>(containers: &'a [Container], id: &str) -> Result<&'a Container> {
    position(containers, id).map(|i| &containers[i])
}

fn find_mut<'a>(containers: &'a mut [Container], id: &str) -> Result<&'a mut Container> {
    let i = position(containers, id)?;
    Ok(&mut containers[i])
}

/// Generates a 64-hex-character id like the runtime's.
fn generate_id() -> ContainerId {
    ContainerId::new(format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    ))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dockboard_common::types::PortBindings;

    use super::*;

    fn container(id: &str, name: &str, status: ContainerStatus) -> Container {
        Container {
            id: ContainerId::new(id),
            name: name.into(),
            image_tags: vec!["nginx:latest".into()],
            status,
            created: None,
            ports: PortBindings::new(),
            labels: BTreeMap::new(),
            state: serde_json::Value::Null,
            config: RecreateConfig::default(),
        }
    }

    #[test]
    fn lookup_by_name_and_prefix() {
        let gw = InMemoryGateway::with_containers([container("aaaa1111", "web", ContainerStatus::Running)]);
        assert_eq!(gw.get_container("web").unwrap().id.as_str(), "aaaa1111");
        assert_eq!(gw.get_container("aaaa").unwrap().name, "web");
        assert!(matches!(gw.get_container("bbbb"), Err(DockboardError::NotFound { .. })));
    }

    #[test]
    fn listing_filters_stopped_unless_asked() {
        let gw = InMemoryGateway::with_containers([
            container("a1", "web", ContainerStatus::Running),
            container("b2", "job", ContainerStatus::Exited),
        ]);
        assert_eq!(gw.list_containers(false).unwrap().len(), 1);
        assert_eq!(gw.list_containers(true).unwrap().len(), 2);
    }

    #[test]
    fn running_container_cannot_be_removed() {
        let gw = InMemoryGateway::with_containers([container("a1", "web", ContainerStatus::Running)]);
        assert!(gw.remove_container(&ContainerId::new("a1")).is_err());
        gw.stop(&ContainerId::new("a1")).unwrap();
        gw.remove_container(&ContainerId::new("a1")).unwrap();
        assert!(gw.by_name("web").is_none());
    }

    #[test]
    fn names_are_unique() {
        let gw = InMemoryGateway::with_containers([container("a1", "web", ContainerStatus::Running)]);
        let spec = ContainerSpec {
            name: "web".into(),
            image: "nginx:latest".into(),
            ..ContainerSpec::default()
        };
        assert!(gw.create_container(&spec).is_err());
    }

    #[test]
    fn created_ids_look_like_runtime_ids() {
        let gw = InMemoryGateway::new();
        let spec = ContainerSpec {
            name: "api".into(),
            image: "api:2".into(),
            ..ContainerSpec::default()
        };
        let created = gw.create_container(&spec).unwrap();
        assert_eq!(created.id.as_str().len(), 64);
        assert_eq!(created.status, ContainerStatus::Created);
    }

    #[test]
    fn injected_failures_surface_and_are_journaled() {
        let gw = InMemoryGateway::new();
        gw.fail(Operation::Pull, "registry unreachable");
        let err = gw.pull_image("nginx:latest").unwrap_err();
        assert!(err.to_string().contains("registry unreachable"));
        assert_eq!(gw.calls(Operation::Pull), 1);
        gw.clear_failures();
        gw.pull_image("nginx:latest").unwrap();
    }
}
