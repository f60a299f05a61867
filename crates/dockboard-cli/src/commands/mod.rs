//! CLI command definitions and dispatch.

pub mod describe;
pub mod lifecycle;
pub mod ps;
pub mod serve;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dockboard_common::config::{BackendKind, DashboardConfig, GenerationConfig};
use dockboard_common::constants;

/// Dockboard: a dashboard for the containers on this host.
#[derive(Parser, Debug)]
#[command(name = "dockboard", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute; `serve` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Runtime backend: `api` (Engine API socket) or `cli` (docker binary).
    #[arg(long, global = true, env = "DOCKBOARD_BACKEND", default_value_t = BackendKind::Api)]
    pub backend: BackendKind,

    /// Host placed in container URLs.
    #[arg(long, global = true, env = "DOCKBOARD_LAN_HOST", default_value = constants::DEFAULT_LAN_HOST)]
    pub lan_host: String,

    /// Bound on ordinary runtime calls, in seconds.
    #[arg(long, global = true, default_value_t = constants::DEFAULT_RUNTIME_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Bound on image pulls, in seconds.
    #[arg(long, global = true, default_value_t = constants::DEFAULT_PULL_TIMEOUT_SECS)]
    pub pull_timeout: u64,

    /// API key enabling generated descriptions.
    #[arg(long, global = true, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used for generated descriptions.
    #[arg(long, global = true, env = "DOCKBOARD_MODEL", default_value = constants::DEFAULT_GENERATION_MODEL)]
    pub model: String,

    /// Verbose logging.
    #[arg(long, global = true, env = "DOCKBOARD_DEBUG")]
    pub debug: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

impl GlobalArgs {
    /// Builds and validates the dashboard configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range.
    pub fn config(&self) -> anyhow::Result<DashboardConfig> {
        let generation = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| {
                let mut generation = GenerationConfig::new(key);
                generation.model.clone_from(&self.model);
                generation
            });
        let config = DashboardConfig {
            lan_host: self.lan_host.clone(),
            backend: self.backend,
            runtime_timeout: Duration::from_secs(self.timeout),
            pull_timeout: Duration::from_secs(self.pull_timeout),
            debug: self.debug,
            generation,
            ..DashboardConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the web dashboard (default).
    Serve(serve::ServeArgs),
    /// List containers.
    Ps(ps::PsArgs),
    /// Start a container.
    Start(lifecycle::TargetArgs),
    /// Stop a container.
    Stop(lifecycle::TargetArgs),
    /// Restart a container.
    Restart(lifecycle::TargetArgs),
    /// Pull the container's image and recreate it.
    Update(lifecycle::TargetArgs),
    /// Show (or regenerate) a container's description.
    Describe(describe::DescribeArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.global.config()?;
    match cli.command {
        None => serve::execute(&serve::ServeArgs::default(), config),
        Some(Command::Serve(args)) => serve::execute(&args, config),
        Some(Command::Ps(args)) => ps::execute(&args, &config),
        Some(Command::Start(args)) => lifecycle::start(&args, &config),
        Some(Command::Stop(args)) => lifecycle::stop(&args, &config),
        Some(Command::Restart(args)) => lifecycle::restart(&args, &config),
        Some(Command::Update(args)) => lifecycle::update(&args, &config),
        Some(Command::Describe(args)) => describe::execute(&args, &config),
    }
}
