//! `dockboard serve` — Run the web dashboard.

use anyhow::Context;
use clap::Args;
use dockboard_common::config::DashboardConfig;
use dockboard_common::constants::DEFAULT_LISTEN_ADDR;
use dockboard_web::AppState;
use dockboard_web::state::Services;

use crate::wiring;

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "DOCKBOARD_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// List stopped containers on the index page too.
    #[arg(short, long)]
    pub all: bool,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            listen: std::env::var("DOCKBOARD_LISTEN")
                .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            all: false,
        }
    }
}

/// Executes the `serve` command.
///
/// Blocking components (the runtime gateway, the generation client) are
/// created outside the async runtime and released only after it has shut
/// down.
///
/// # Errors
///
/// Returns an error if the runtime cannot be reached or the listener
/// cannot be bound.
pub fn execute(args: &ServeArgs, mut config: DashboardConfig) -> anyhow::Result<()> {
    config.listen_addr.clone_from(&args.listen);
    config.index_includes_stopped = args.all;

    let wiring = wiring::build(&config)?;
    let state = AppState::new(Services {
        snapshots: wiring.snapshots,
        lifecycle: wiring.lifecycle,
        index_includes_stopped: config.index_includes_stopped,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dockboard-http")
        .build()
        .context("failed to start the async runtime")?;

    let served = runtime.block_on({
        let state = state.clone();
        let listen = config.listen_addr.clone();
        async move {
            let listener = tokio::net::TcpListener::bind(&listen)
                .await
                .with_context(|| format!("failed to bind {listen}"))?;
            dockboard_web::serve(listener, state, shutdown_signal())
                .await
                .context("server error")
        }
    });

    drop(runtime);
    drop(state);
    tracing::info!("dashboard stopped");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                let _ = sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown requested");
}
