//! Port resolution: binding tables → reachable mappings and a primary URL.
//!
//! Pure functions only; no runtime access.

use std::collections::HashSet;

use dockboard_common::constants::{HTTPS_PORT, PREFERRED_PORTS};
use dockboard_common::types::{ContainerPort, PortBindings};
use serde::{Deserialize, Serialize};

/// One reachable host binding of a container port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Container side, e.g. `80/tcp`.
    pub container_port: ContainerPort,
    /// Host side port.
    pub host_port: u16,
    /// Host listen address as reported by the runtime.
    pub host_ip: String,
}

/// Result of resolving a container's port table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortResolution {
    /// Deduplicated mappings, ordered by container port.
    pub mappings: Vec<PortMapping>,
    /// URL users should open, if any port is published.
    pub primary_url: Option<String>,
}

/// Resolves a binding table against the LAN host used in URLs.
///
/// A binding reported once per address family collapses into a single
/// mapping that keeps the first reported address. Bindings without a
/// usable host port are dropped.
#[must_use]
pub fn resolve(bindings: &PortBindings, lan_host: &str) -> PortResolution {
    let mappings = mappings(bindings);
    let primary_url = primary_url(&mappings, lan_host);
    PortResolution {
        mappings,
        primary_url,
    }
}

/// Deduplicated mappings in container-port order.
#[must_use]
pub fn mappings(bindings: &PortBindings) -> Vec<PortMapping> {
    let mut seen = HashSet::new();
    let mut mappings = Vec::new();
    for (container_port, hosts) in bindings {
        for host in hosts {
            let Ok(host_port) = host.host_port.trim().parse::<u16>() else {
                continue;
            };
            if host_port == 0 || !seen.insert((host_port, *container_port)) {
                continue;
            }
            mappings.push(PortMapping {
                container_port: *container_port,
                host_port,
                host_ip: host.host_ip.clone(),
            });
        }
    }
    mappings
}

/// Picks the primary URL: the first preferred TCP port that is published,
/// otherwise the first mapping.
#[must_use]
pub fn primary_url(mappings: &[PortMapping], lan_host: &str) -> Option<String> {
    let preferred = PREFERRED_PORTS.iter().find_map(|&port| {
        mappings
            .iter()
            .find(|m| m.container_port == ContainerPort::tcp(port))
    });
    let chosen = preferred.or_else(|| mappings.first())?;
    let scheme = if preferred.is_some() && chosen.container_port.port == HTTPS_PORT {
        "https"
    } else {
        "http"
    };
    Some(format!("{scheme}://{}:{}", url_host(lan_host), chosen.host_port))
}

fn url_host(lan_host: &str) -> String {
    if lan_host.contains(':') && !lan_host.starts_with('[') {
        format!("[{lan_host}]")
    } else {
        lan_host.to_string()
    }
}
