//! `dockboard ps` — List containers with their URL and description.

use clap::Args;
use dockboard_common::config::DashboardConfig;

use crate::output;
use crate::wiring;

/// Arguments for the `ps` command.
#[derive(Args, Debug)]
pub struct PsArgs {
    /// Show all containers (including stopped).
    #[arg(short, long)]
    pub all: bool,

    /// Print the snapshots as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `ps` command.
///
/// # Errors
///
/// Returns an error if the runtime cannot be listed.
pub fn execute(args: &PsArgs, config: &DashboardConfig) -> anyhow::Result<()> {
    let wiring = wiring::build(config)?;
    let snapshots = wiring.snapshots.list(args.all)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("No containers found.");
        return Ok(());
    }

    let now = chrono::Utc::now();
    println!(
        "{:<14} {:<20} {:<10} {:<24} {:<28} {:<16} DESCRIPTION",
        "CONTAINER ID", "NAME", "STATUS", "IMAGE", "URL", "CREATED"
    );
    for s in &snapshots {
        println!(
            "{:<14} {:<20} {:<10} {:<24} {:<28} {:<16} {}",
            s.id,
            output::truncate(&s.name, 20),
            s.status,
            output::truncate(&s.image, 24),
            s.url.as_deref().unwrap_or("-"),
            s.created
                .as_deref()
                .map_or_else(|| "-".to_string(), |c| output::format_age(c, now)),
            s.description
        );
        if !s.ports.is_empty() {
            println!("{:<14} ports: {}", "", output::format_ports(&s.ports));
        }
    }

    Ok(())
}
