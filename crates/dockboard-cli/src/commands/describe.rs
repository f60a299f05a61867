//! `dockboard describe` — Show a container's description.

use clap::Args;
use dockboard_common::config::DashboardConfig;

use crate::wiring;

/// Arguments for the `describe` command.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Container id, short id, or name.
    pub container: String,

    /// Ask the generator for a fresh description.
    #[arg(long)]
    pub regenerate: bool,
}

/// Executes the `describe` command.
///
/// A regenerated description only lives in this process; it is not
/// written to the container.
///
/// # Errors
///
/// Returns an error if the container is unknown, or if `--regenerate` is
/// given without an API key.
pub fn execute(args: &DescribeArgs, config: &DashboardConfig) -> anyhow::Result<()> {
    let wiring = wiring::build(config)?;
    if args.regenerate {
        let description = wiring.snapshots.regenerate_description(&args.container)?;
        println!("{}", description.text);
    } else {
        let snapshot = wiring.snapshots.snapshot(&args.container)?;
        println!(
            "{} ({})",
            snapshot.description,
            snapshot.description_source.as_str()
        );
    }
    Ok(())
}
