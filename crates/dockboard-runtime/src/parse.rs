//! Parsing of `docker ps --format '{{json .}}'` output.
//!
//! The CLI prints one JSON object per line. A line that does not parse is
//! logged and skipped; it never aborts the listing.

use std::collections::BTreeMap;

use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::{
    Container, ContainerId, ContainerPort, ContainerStatus, HostBinding, PortBindings,
    RecreateConfig, is_tag_reference,
};
use serde::Deserialize;

/// One line of `docker ps` JSON output.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PsLine {
    #[serde(rename = "ID")]
    id: String,
    names: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    ports: String,
    #[serde(default)]
    labels: String,
    #[serde(default)]
    created_at: String,
}

/// Parses a whole `docker ps` output, skipping malformed lines.
#[must_use]
pub fn parse_ps_output(stdout: &str) -> Vec<Container> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parse_ps_line(line) {
            Ok(container) => Some(container),
            Err(e) => {
                tracing::warn!(error = %e, line = %line, "skipping malformed ps line");
                None
            }
        })
        .collect()
}

/// Parses a single `docker ps` JSON line.
///
/// # Errors
///
/// Returns `RuntimeUnavailable` if the line is not a ps JSON object.
pub fn parse_ps_line(line: &str) -> Result<Container> {
    let ps: PsLine = serde_json::from_str(line)
        .map_err(|e| DockboardError::runtime(format!("malformed ps output: {e}")))?;
    if ps.id.trim().is_empty() {
        return Err(DockboardError::runtime("ps output line without container id"));
    }

    let status = if ps.state.is_empty() {
        status_from_text(&ps.status)
    } else {
        ContainerStatus::from_runtime(&ps.state)
    };
    let name = ps.names.split(',').next().unwrap_or_default().trim().to_string();
    let image_tags = if is_tag_reference(&ps.image) {
        vec![ps.image.trim().to_string()]
    } else {
        Vec::new()
    };

    Ok(Container {
        id: ContainerId::new(ps.id.trim()),
        name,
        image_tags,
        status,
        created: (!ps.created_at.is_empty()).then_some(ps.created_at),
        ports: parse_ports(&ps.ports),
        labels: parse_labels(&ps.labels),
        state: serde_json::json!({
            "Status": status.as_str(),
            "Running": status == ContainerStatus::Running,
            "Text": ps.status,
        }),
        config: RecreateConfig::default(),
    })
}

/// Derives a status from the human text (`Up 3 hours`) printed by CLIs
/// too old to report `State`.
fn status_from_text(text: &str) -> ContainerStatus {
    let text = text.trim();
    if text.starts_with("Up") {
        if text.contains("(Paused)") {
            ContainerStatus::Paused
        } else {
            ContainerStatus::Running
        }
    } else if text.starts_with("Exited") {
        ContainerStatus::Exited
    } else if text.starts_with("Created") {
        ContainerStatus::Created
    } else if text.starts_with("Restarting") {
        ContainerStatus::Restarting
    } else if text.starts_with("Removal") {
        ContainerStatus::Removing
    } else if text.starts_with("Dead") {
        ContainerStatus::Dead
    } else {
        ContainerStatus::Unknown
    }
}

/// Parses the `Ports` column, e.g.
/// `0.0.0.0:8080->80/tcp, :::8080->80/tcp, 443/tcp`.
///
/// Exposed-only entries (no `->`) carry no host binding and are skipped.
/// Port ranges are expanded pairwise.
#[must_use]
pub fn parse_ports(ports: &str) -> PortBindings {
    let mut bindings = PortBindings::new();
    for entry in ports.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((host, container)) = entry.split_once("->") else {
            continue;
        };
        let Some((host_ip, host_ports)) = host.rsplit_once(':') else {
            tracing::debug!(entry = %entry, "port entry without host address");
            continue;
        };
        let host_ip = host_ip.trim_start_matches('[').trim_end_matches(']');
        let (container_ports, protocol) = container.split_once('/').unwrap_or((container, "tcp"));

        let (Some(host_range), Some(container_range)) =
            (parse_range(host_ports), parse_range(container_ports))
        else {
            tracing::debug!(entry = %entry, "unparsable port entry");
            continue;
        };
        if host_range.len() != container_range.len() {
            tracing::debug!(entry = %entry, "mismatched port ranges");
            continue;
        }

        for (host_port, container_port) in host_range.zip(container_range) {
            let Ok(key) = format!("{container_port}/{protocol}").parse::<ContainerPort>() else {
                continue;
            };
            bindings
                .entry(key)
                .or_default()
                .push(HostBinding::new(host_ip, host_port.to_string()));
        }
    }
    bindings
}

fn parse_range(s: &str) -> Option<std::ops::RangeInclusive<u16>> {
    match s.split_once('-') {
        Some((start, end)) => {
            let (start, end) = (start.parse().ok()?, end.parse().ok()?);
            (start <= end).then_some(start..=end)
        }
        None => {
            let port = s.parse().ok()?;
            Some(port..=port)
        }
    }
}

/// Parses the `Labels` column (`k=v,k2=v2`).
///
/// Values may themselves contain commas, so a segment without `=` is
/// appended to the previous value.
#[must_use]
pub fn parse_labels(labels: &str) -> BTreeMap<String, String> {
    let mut parsed = BTreeMap::new();
    let mut last_key: Option<String> = None;
    for segment in labels.split(',') {
        match segment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !key.contains(' ') => {
                let key = key.trim().to_string();
                let _ = parsed.insert(key.clone(), value.to_string());
                last_key = Some(key);
            }
            _ => {
                if let Some(value) = last_key.as_ref().and_then(|k| parsed.get_mut(k)) {
                    value.push(',');
                    value.push_str(segment);
                }
            }
        }
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"{"Command":"\"/docker-entrypoint.…\"","CreatedAt":"2025-01-01 10:00:00 +0000 UTC","ID":"4f66ad9a0b2e8c1d3f5a7b9c0d1e2f3a4b5c6d7e8f90a1b2c3d4e5f6a7b8c9d0","Image":"nginx:1.27","Labels":"app.description=Serves the landing page, mostly,maintainer=ops","Names":"web","Ports":"0.0.0.0:8080->80/tcp, :::8080->80/tcp","State":"running","Status":"Up 3 hours"}"#;

    #[test]
    fn ps_line_is_normalized() {
        let c = parse_ps_line(LINE).expect("parses");
        assert_eq!(c.id.short(), "4f66ad9a0b2e");
        assert_eq!(c.name, "web");
        assert_eq!(c.primary_tag(), Some("nginx:1.27"));
        assert_eq!(c.status, ContainerStatus::Running);
        assert_eq!(c.created.as_deref(), Some("2025-01-01 10:00:00 +0000 UTC"));
        assert_eq!(c.state["Text"], "Up 3 hours");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let output = format!("{LINE}\nnot json at all\n{{\"Names\":\"no-id\"}}\n\n{LINE}\n");
        let containers = parse_ps_output(&output);
        assert_eq!(containers.len(), 2);
    }

    #[test]
    fn ports_keep_both_address_families() {
        let ports = parse_ports("0.0.0.0:8080->80/tcp, :::8080->80/tcp");
        let bindings = &ports[&ContainerPort::tcp(80)];
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0], HostBinding::new("0.0.0.0", "8080"));
        assert_eq!(bindings[1], HostBinding::new("::", "8080"));
    }

    #[test]
    fn bracketed_ipv6_is_unwrapped() {
        let ports = parse_ports("[::]:9000->9000/tcp");
        assert_eq!(ports[&ContainerPort::tcp(9000)][0].host_ip, "::");
    }

    #[test]
    fn exposed_only_ports_are_ignored() {
        let ports = parse_ports("443/tcp, 0.0.0.0:3000->3000/tcp");
        assert_eq!(ports.len(), 1);
        assert!(ports.contains_key(&ContainerPort::tcp(3000)));
    }

    #[test]
    fn port_ranges_expand_pairwise() {
        let ports = parse_ports("0.0.0.0:8000-8002->9000-9002/udp");
        assert_eq!(ports.len(), 3);
        let key: ContainerPort = "9001/udp".parse().unwrap();
        assert_eq!(ports[&key][0].host_port, "8001");
    }

    #[test]
    fn empty_ports_column_yields_nothing() {
        assert!(parse_ports("").is_empty());
    }

    #[test]
    fn labels_tolerate_commas_in_values() {
        let labels = parse_labels("app.description=Serves the landing page, mostly,maintainer=ops");
        assert_eq!(labels["app.description"], "Serves the landing page, mostly");
        assert_eq!(labels["maintainer"], "ops");
    }

    #[test]
    fn status_falls_back_to_text() {
        let line = r#"{"ID":"abc","Names":"old","Image":"redis","Status":"Exited (0) 2 days ago"}"#;
        assert_eq!(parse_ps_line(line).unwrap().status, ContainerStatus::Exited);
    }

    #[test]
    fn untagged_image_has_no_tags() {
        let line = r#"{"ID":"abc","Names":"local","Image":"4f66ad9a0b2e","State":"running"}"#;
        assert!(parse_ps_line(line).unwrap().image_tags.is_empty());
    }
}
