//! `dockboard start|stop|restart|update` — Lifecycle operations.

use clap::Args;
use dockboard_common::config::DashboardConfig;
use dockboard_core::lifecycle::Action;

use crate::wiring;

/// Target of a lifecycle command.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Container id, short id, or name.
    pub container: String,
}

fn run(args: &TargetArgs, config: &DashboardConfig, action: Action) -> anyhow::Result<()> {
    let wiring = wiring::build(config)?;
    let name = wiring.lifecycle.run(action, &args.container)?;
    println!("Container {name} {}", action.past_tense());
    Ok(())
}

/// Executes `start`.
///
/// # Errors
///
/// Returns an error if the container is unknown, busy, or refused.
pub fn start(args: &TargetArgs, config: &DashboardConfig) -> anyhow::Result<()> {
    run(args, config, Action::Start)
}

/// Executes `stop`.
///
/// # Errors
///
/// Returns an error if the container is unknown, busy, or refused.
pub fn stop(args: &TargetArgs, config: &DashboardConfig) -> anyhow::Result<()> {
    run(args, config, Action::Stop)
}

/// Executes `restart`.
///
/// # Errors
///
/// Returns an error if the container is unknown, busy, or refused.
pub fn restart(args: &TargetArgs, config: &DashboardConfig) -> anyhow::Result<()> {
    run(args, config, Action::Restart)
}

/// Executes `update`.
///
/// # Errors
///
/// Returns an error if the image has no tag, the pull fails, or the
/// container could not be recreated.
pub fn update(args: &TargetArgs, config: &DashboardConfig) -> anyhow::Result<()> {
    let wiring = wiring::build(config)?;
    let outcome = wiring.lifecycle.update(&args.container)?;
    println!(
        "Container {} updated from {} (new id {})",
        outcome.name, outcome.image, outcome.new_id
    );
    Ok(())
}
