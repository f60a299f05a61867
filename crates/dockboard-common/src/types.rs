//! Domain primitive types used across the Dockboard workspace.
//!
//! [`Container`] is the single normalized shape every runtime gateway
//! produces, whichever backend it talks to.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::SHORT_ID_LENGTH;
use crate::error::{DockboardError, Result};

/// Identifier of a container as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the runtime's canonical short form (first 12 characters).
    #[must_use]
    pub fn short(&self) -> &str {
        self.0
            .char_indices()
            .nth(SHORT_ID_LENGTH)
            .map_or(self.0.as_str(), |(end, _)| &self.0[..end])
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a container, as the runtime names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Created but never started.
    Created,
    /// Actively running.
    Running,
    /// Processes frozen.
    Paused,
    /// Being restarted by its restart policy.
    Restarting,
    /// Being removed.
    Removing,
    /// Process has exited.
    Exited,
    /// Failed removal or otherwise defunct.
    Dead,
    /// Status the dashboard does not recognize.
    Unknown,
}

impl ContainerStatus {
    /// Returns whether the container holds a live process that `stop` acts on.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Restarting | Self::Paused)
    }

    /// Maps a runtime status string; unrecognized values become `Unknown`.
    #[must_use]
    pub fn from_runtime(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    /// Lowercase runtime name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }
}

impl FromStr for ContainerStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_runtime(s))
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport protocol of an exposed port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
    /// SCTP.
    Sctp,
}

impl Protocol {
    /// Lowercase name as used in port keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Sctp => "sctp",
        }
    }
}

/// A container-side port and its protocol, written `80/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerPort {
    /// Port number inside the container.
    pub port: u16,
    /// Transport protocol.
    pub protocol: Protocol,
}

impl ContainerPort {
    /// Creates a TCP container port.
    #[must_use]
    pub const fn tcp(port: u16) -> Self {
        Self {
            port,
            protocol: Protocol::Tcp,
        }
    }
}

impl FromStr for ContainerPort {
    type Err = DockboardError;

    /// Parses `80/tcp`, `53/udp`, or a bare `80` (TCP).
    fn from_str(s: &str) -> Result<Self> {
        let (port, protocol) = s.trim().split_once('/').unwrap_or((s.trim(), "tcp"));
        let port = port.parse().map_err(|_| DockboardError::Validation {
            message: format!("invalid container port: {s}"),
        })?;
        let protocol = match protocol.to_ascii_lowercase().as_str() {
            "tcp" => Protocol::Tcp,
            "udp" => Protocol::Udp,
            "sctp" => Protocol::Sctp,
            other => {
                return Err(DockboardError::Validation {
                    message: format!("unsupported protocol {other} in port {s}"),
                });
            }
        };
        Ok(Self { port, protocol })
    }
}

impl TryFrom<String> for ContainerPort {
    type Error = DockboardError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ContainerPort> for String {
    fn from(value: ContainerPort) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ContainerPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol.as_str())
    }
}

/// One host-side binding of a container port.
///
/// Both fields are kept as the runtime reports them: an empty host port in
/// a configured binding asks the runtime to pick one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostBinding {
    /// Listen address on the host (`0.0.0.0`, `::`, or empty).
    pub host_ip: String,
    /// Host port as text.
    pub host_port: String,
}

impl HostBinding {
    /// Creates a binding from its address and port.
    #[must_use]
    pub fn new(host_ip: impl Into<String>, host_port: impl Into<String>) -> Self {
        Self {
            host_ip: host_ip.into(),
            host_port: host_port.into(),
        }
    }
}

/// Container port → host bindings, ordered by container port.
pub type PortBindings = BTreeMap<ContainerPort, Vec<HostBinding>>;

/// The parts of a container's configuration an update carries over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecreateConfig {
    /// Port bindings as configured (not as currently published).
    pub port_bindings: PortBindings,
    /// Environment in `KEY=value` form.
    pub env: Vec<String>,
    /// Volume binds in `source:target[:mode]` form.
    pub binds: Vec<String>,
}

/// A container as read through a runtime gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Full runtime identifier.
    pub id: ContainerId,
    /// Unique name, without the leading slash.
    pub name: String,
    /// Repository tags of the container's image; empty when untagged.
    pub image_tags: Vec<String>,
    /// Current lifecycle status.
    pub status: ContainerStatus,
    /// Creation timestamp as reported by the runtime.
    pub created: Option<String>,
    /// Currently published port bindings.
    pub ports: PortBindings,
    /// Container labels.
    pub labels: BTreeMap<String, String>,
    /// Raw state blob from the runtime.
    pub state: serde_json::Value,
    /// Configuration captured for recreation. Empty when the backend
    /// produced this container from a summary listing.
    pub config: RecreateConfig,
}

impl Container {
    /// First image tag, used as the pull reference on update.
    #[must_use]
    pub fn primary_tag(&self) -> Option<&str> {
        self.image_tags.first().map(String::as_str)
    }

    /// Returns a non-empty label value.
    #[must_use]
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// An image reference split into repository and tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Repository, including any registry host and port.
    pub repository: String,
    /// Tag, `latest` when the reference names none.
    pub tag: String,
}

impl ImageRef {
    /// Splits `registry:5000/app:1.2` into `registry:5000/app` and `1.2`.
    ///
    /// Digest references (`app@sha256:...`) keep the digest as the tag.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        if let Some((repository, digest)) = reference.split_once('@') {
            return Self {
                repository: repository.to_string(),
                tag: digest.to_string(),
            };
        }
        let name_start = reference.rfind('/').map_or(0, |i| i + 1);
        match reference[name_start..].rfind(':') {
            Some(colon) => {
                let split = name_start + colon;
                Self {
                    repository: reference[..split].to_string(),
                    tag: reference[split + 1..].to_string(),
                }
            }
            None => Self {
                repository: reference.to_string(),
                tag: "latest".to_string(),
            },
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag.contains(':') {
            write!(f, "{}@{}", self.repository, self.tag)
        } else {
            write!(f, "{}:{}", self.repository, self.tag)
        }
    }
}

/// Returns whether an image string reported for a container is a usable
/// tag rather than a bare image id.
#[must_use]
pub fn is_tag_reference(image: &str) -> bool {
    let image = image.trim();
    if image.is_empty() || image.starts_with("sha256:") {
        return false;
    }
    let bare_id = image.len() >= SHORT_ID_LENGTH && image.chars().all(|c| c.is_ascii_hexdigit());
    !bare_id
}
