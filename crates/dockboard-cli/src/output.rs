//! Formatted output helpers for CLI commands.

use chrono::{DateTime, Utc};
use dockboard_core::ports::PortMapping;

/// Shortens `s` to at most `max` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Formats mappings as `8080->80/tcp, 8443->443/tcp`.
#[must_use]
pub fn format_ports(ports: &[PortMapping]) -> String {
    ports
        .iter()
        .map(|p| format!("{}->{}", p.host_port, p.container_port))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders a runtime creation timestamp as an age (`3 hours ago`).
///
/// Accepts RFC 3339 (Engine API) and the `2025-01-01 10:00:00 +0000 UTC`
/// form printed by `docker ps`. Unparsable input is returned unchanged.
#[must_use]
pub fn format_age(created: &str, now: DateTime<Utc>) -> String {
    let Some(created_at) = parse_created(created) else {
        return created.to_string();
    };
    let secs = (now - created_at).num_seconds().max(0);
    let (value, unit) = match secs {
        0..60 => (secs, "second"),
        60..3_600 => (secs / 60, "minute"),
        3_600..86_400 => (secs / 3_600, "hour"),
        _ => (secs / 86_400, "day"),
    };
    let plural = if value == 1 { "" } else { "s" };
    format!("{value} {unit}{plural} ago")
}

fn parse_created(created: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(created) {
        return Some(at.with_timezone(&Utc));
    }
    let without_zone_name = created.rsplit_once(' ').map_or(created, |(head, _)| head);
    DateTime::parse_from_str(without_zone_name, "%Y-%m-%d %H:%M:%S %z")
        .ok()
        .map(|at| at.with_timezone(&Utc))
}
