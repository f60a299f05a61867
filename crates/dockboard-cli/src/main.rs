//! # dockboard
//!
//! Single-host container dashboard. `dockboard` (or `dockboard serve`)
//! starts the web UI; the other subcommands run the same operations from
//! the shell.

mod commands;
mod output;
mod wiring;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.debug, cli.global.json_logs);
    commands::execute(cli)
}

fn init_tracing(debug: bool, json: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
