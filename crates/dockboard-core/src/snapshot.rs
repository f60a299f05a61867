//! Presentation records built fresh for every request.

use std::sync::Arc;

use dockboard_common::constants::UNKNOWN_IMAGE;
use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::{Container, ContainerStatus};
use dockboard_runtime::gateway::RuntimeGateway;
use serde::{Deserialize, Serialize};

use crate::description::{Description, DescriptionProvider, DescriptionSource, default_description};
use crate::ports::{self, PortMapping};

/// What the dashboard shows for one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    /// Short (12 character) id.
    pub id: String,
    /// Container name.
    pub name: String,
    /// First image tag, or `unknown`.
    pub image: String,
    /// Lifecycle status.
    pub status: ContainerStatus,
    /// Human-readable description.
    pub description: String,
    /// Where the description came from.
    pub description_source: DescriptionSource,
    /// Primary URL, if any port is published.
    pub url: Option<String>,
    /// Published ports.
    pub ports: Vec<PortMapping>,
    /// Creation time as reported by the runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// Raw runtime state.
    pub state: serde_json::Value,
}

/// Builds [`ContainerSnapshot`]s from live runtime data.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    gateway: Arc<dyn RuntimeGateway>,
    descriptions: DescriptionProvider,
    lan_host: String,
}

impl SnapshotBuilder {
    /// Creates a builder placing `lan_host` in primary URLs.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RuntimeGateway>,
        descriptions: DescriptionProvider,
        lan_host: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            descriptions,
            lan_host: lan_host.into(),
        }
    }

    /// Description provider in use.
    #[must_use]
    pub const fn descriptions(&self) -> &DescriptionProvider {
        &self.descriptions
    }

    /// Snapshots every container, or only running ones.
    ///
    /// A full listing also forgets pending descriptions of containers that
    /// no longer exist, so a new container reusing a name starts clean.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the runtime cannot be listed.
    pub fn list(&self, include_stopped: bool) -> Result<Vec<ContainerSnapshot>> {
        let containers = self.gateway.list_containers(include_stopped)?;
        tracing::debug!(count = containers.len(), include_stopped, "building snapshots");
        if include_stopped {
            self.descriptions
                .pending()
                .retain_names(containers.iter().map(|c| c.name.as_str()));
        }
        Ok(containers.iter().map(|c| self.build(c)).collect())
    }

    /// Snapshots a single container by id, short id, or name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the runtime does not know the container.
    pub fn snapshot(&self, id: &str) -> Result<ContainerSnapshot> {
        let container = self.gateway.get_container(id)?;
        Ok(self.build(&container))
    }

    /// Asks the generator for a fresh description of a container.
    ///
    /// The result is stashed for the container's next recreation but is not
    /// shown by later snapshots.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if no generator is configured (checked before
    /// the runtime is queried), or `NotFound` for an unknown container.
    pub fn regenerate_description(&self, id: &str) -> Result<Description> {
        if !self.descriptions.is_configured() {
            return Err(DockboardError::Validation {
                message: "AI API key not configured".into(),
            });
        }
        let container = self.gateway.get_container(id)?;
        self.descriptions.describe(&container, true)
    }

    /// Builds the snapshot of an already fetched container.
    #[must_use]
    pub fn build(&self, container: &Container) -> ContainerSnapshot {
        let resolution = ports::resolve(&container.ports, &self.lan_host);
        let description = self
            .descriptions
            .describe(container, false)
            .unwrap_or_else(|_| Description {
                text: default_description(&container.name),
                source: DescriptionSource::Default,
            });

        ContainerSnapshot {
            id: container.id.short().to_string(),
            name: container.name.clone(),
            image: container.primary_tag().unwrap_or(UNKNOWN_IMAGE).to_string(),
            status: container.status,
            description: description.text,
            description_source: description.source,
            url: resolution.primary_url,
            ports: resolution.mappings,
            created: container.created.clone(),
            state: container.state.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dockboard_common::types::{ContainerId, HostBinding, PortBindings, RecreateConfig};
    use dockboard_runtime::gateway::memory::InMemoryGateway;

    use super::*;
    use crate::pending::PendingLabels;

    fn container(id: &str, name: &str, status: ContainerStatus) -> Container {
        let mut ports = PortBindings::new();
        let _ = ports.insert(
            "80/tcp".parse().unwrap(),
            vec![HostBinding::new("0.0.0.0", "8080"), HostBinding::new("::", "8080")],
        );
        Container {
            id: ContainerId::new(id),
            name: name.into(),
            image_tags: vec![],
            status,
            created: Some("2025-01-01T10:00:00Z".into()),
            ports,
            labels: BTreeMap::new(),
            state: serde_json::json!({"Status": status.as_str()}),
            config: RecreateConfig::default(),
        }
    }

    fn builder(gateway: InMemoryGateway) -> SnapshotBuilder {
        SnapshotBuilder::new(
            Arc::new(gateway),
            DescriptionProvider::new(None, Arc::new(PendingLabels::new())),
            "192.168.1.5",
        )
    }

    #[test]
    fn snapshot_normalizes_for_display() {
        let b = builder(InMemoryGateway::with_containers([container(
            "4f66ad9a0b2e8c1d3f5a",
            "web",
            ContainerStatus::Running,
        )]));
        let s = b.snapshot("web").unwrap();
        assert_eq!(s.id, "4f66ad9a0b2e");
        assert_eq!(s.image, "unknown");
        assert_eq!(s.description, "Container: web");
        assert_eq!(s.url.as_deref(), Some("http://192.168.1.5:8080"));
        assert_eq!(s.ports.len(), 1);
    }

    #[test]
    fn listing_is_idempotent() {
        let b = builder(InMemoryGateway::with_containers([
            container("aaaaaaaaaaaaaaaa", "web", ContainerStatus::Running),
            container("bbbbbbbbbbbbbbbb", "job", ContainerStatus::Exited),
        ]));
        let first = b.list(true).unwrap();
        let second = b.list(true).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(b.list(false).unwrap().len(), 1);
    }

    struct Numbered(std::sync::Mutex<usize>);

    impl crate::description::TextGenerator for Numbered {
        fn generate(&self, _prompt: &str) -> Result<String> {
            let mut n = self.0.lock().unwrap();
            *n += 1;
            Ok(format!("description #{n}"))
        }
    }

    fn generating_builder(gateway: InMemoryGateway) -> (SnapshotBuilder, Arc<Numbered>) {
        let generator = Arc::new(Numbered(std::sync::Mutex::new(0)));
        let builder = SnapshotBuilder::new(
            Arc::new(gateway),
            DescriptionProvider::new(Some(generator.clone()), Arc::new(PendingLabels::new())),
            "192.168.1.5",
        );
        (builder, generator)
    }

    #[test]
    fn listing_is_idempotent_with_a_generator() {
        let (b, generator) = generating_builder(InMemoryGateway::with_containers([
            container("aaaaaaaaaaaaaaaa", "web", ContainerStatus::Running),
            container("bbbbbbbbbbbbbbbb", "job", ContainerStatus::Exited),
        ]));
        let first = b.list(true).unwrap();
        let second = b.list(true).unwrap();
        assert_eq!(first, second);
        assert_eq!(*generator.0.lock().unwrap(), 2);
    }

    #[test]
    fn full_listing_forgets_removed_containers() {
        let (b, _) = generating_builder(InMemoryGateway::with_containers([container(
            "aaaaaaaaaaaaaaaa",
            "web",
            ContainerStatus::Running,
        )]));
        b.descriptions().pending().record("old", "Stale description.");
        let _ = b.list(false).unwrap();
        assert!(b.descriptions().pending().peek("old").is_some());
        let _ = b.list(true).unwrap();
        assert!(b.descriptions().pending().peek("old").is_none());
        assert!(b.descriptions().pending().peek("web").is_some());
    }

    #[test]
    fn created_is_omitted_when_unknown() {
        let mut c = container("cccccccccccccccc", "api", ContainerStatus::Created);
        c.created = None;
        let s = builder(InMemoryGateway::new()).build(&c);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("created").is_none());
        assert_eq!(json["status"], "created");
    }

    #[test]
    fn regenerate_without_generator_skips_the_runtime() {
        let gw = InMemoryGateway::new();
        gw.fail(dockboard_runtime::gateway::memory::Operation::Get, "must not be called");
        let err = builder(gw).regenerate_description("ghost").unwrap_err();
        assert_eq!(err.to_string(), "AI API key not configured");
    }
}
