//! Normalization of Engine API inspect documents into [`Container`].
//!
//! The API backend receives these documents from `bollard`; the CLI backend
//! deserializes the same JSON from `docker inspect`, so both end up here.

use std::collections::{BTreeMap, HashMap};

use bollard::models::{ContainerInspectResponse, PortBinding, PortMap};
use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::{
    Container, ContainerId, ContainerPort, ContainerStatus, HostBinding, PortBindings,
    RecreateConfig, is_tag_reference,
};

/// Builds a [`Container`] from an inspect document and the repository tags
/// of its image.
///
/// When the image has lost its tags (re-tagged by a later pull), the
/// reference the container was created from is used if it names a tag.
///
/// # Errors
///
/// Returns `RuntimeUnavailable` if the document carries no container id.
pub fn container_from_inspect(
    inspect: ContainerInspectResponse,
    image_tags: Vec<String>,
) -> Result<Container> {
    let id = inspect
        .id
        .ok_or_else(|| DockboardError::runtime("inspect output is missing the container id"))?;
    let name = inspect
        .name
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string();

    let status = inspect
        .state
        .as_ref()
        .and_then(|s| s.status.as_ref())
        .map_or(ContainerStatus::Unknown, |s| {
            ContainerStatus::from_runtime(&s.to_string())
        });
    let state = inspect
        .state
        .as_ref()
        .and_then(|s| serde_json::to_value(s).ok())
        .unwrap_or(serde_json::Value::Null);

    let ports = inspect
        .network_settings
        .and_then(|n| n.ports)
        .map(|p| port_map_to_bindings(&p))
        .unwrap_or_default();

    let (labels, env, configured_image) = inspect.config.map_or_else(
        || (BTreeMap::new(), Vec::new(), None),
        |c| {
            (
                c.labels.unwrap_or_default().into_iter().collect(),
                c.env.unwrap_or_default(),
                c.image,
            )
        },
    );

    let (port_bindings, binds) = inspect.host_config.map_or_else(
        || (PortBindings::new(), Vec::new()),
        |h| {
            (
                h.port_bindings
                    .map(|p| port_map_to_bindings(&p))
                    .unwrap_or_default(),
                h.binds.unwrap_or_default(),
            )
        },
    );

    let image_tags = if image_tags.is_empty() {
        configured_image
            .filter(|image| is_tag_reference(image))
            .into_iter()
            .collect()
    } else {
        image_tags
    };

    Ok(Container {
        id: ContainerId::new(id),
        name,
        image_tags,
        status,
        created: inspect.created,
        ports,
        labels,
        state,
        config: RecreateConfig {
            port_bindings,
            env,
            binds,
        },
    })
}

/// Converts an Engine API port map. Keys that do not parse as
/// `port/protocol` are dropped.
#[must_use]
pub fn port_map_to_bindings(map: &PortMap) -> PortBindings {
    let mut bindings = PortBindings::new();
    for (key, hosts) in map {
        let Ok(port) = key.parse::<ContainerPort>() else {
            tracing::debug!(key = %key, "skipping unparsable port key");
            continue;
        };
        let hosts = hosts
            .iter()
            .flatten()
            .map(|b| {
                HostBinding::new(
                    b.host_ip.clone().unwrap_or_default(),
                    b.host_port.clone().unwrap_or_default(),
                )
            })
            .collect();
        let _ = bindings.insert(port, hosts);
    }
    bindings
}

/// Converts bindings back into the Engine API's exposed-port set and port
/// map, as expected by container creation.
#[must_use]
pub fn bindings_to_port_map(
    bindings: &PortBindings,
) -> (HashMap<String, HashMap<(), ()>>, PortMap) {
    bindings
        .iter()
        .map(|(port, hosts)| {
            let key = port.to_string();
            let host_bindings = hosts
                .iter()
                .map(|h| PortBinding {
                    host_ip: (!h.host_ip.is_empty()).then(|| h.host_ip.clone()),
                    host_port: Some(h.host_port.clone()),
                })
                .collect();
            ((key.clone(), HashMap::new()), (key, Some(host_bindings)))
        })
        .unzip()
}
