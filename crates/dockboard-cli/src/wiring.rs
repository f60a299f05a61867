//! Construction of the core components from configuration.
//!
//! Nothing is global: the gateway, the generator, and the pending-label
//! stash are created here once and handed to whoever needs them.

use std::sync::Arc;

use anyhow::Context;
use dockboard_common::config::DashboardConfig;
use dockboard_core::description::{DescriptionProvider, TextGenerator};
use dockboard_core::generator::AnthropicGenerator;
use dockboard_core::lifecycle::LifecycleController;
use dockboard_core::pending::PendingLabels;
use dockboard_core::snapshot::SnapshotBuilder;
use dockboard_runtime::gateway;

/// The core components, ready to use.
pub struct Wiring {
    /// Snapshot and description queries.
    pub snapshots: SnapshotBuilder,
    /// Lifecycle operations.
    pub lifecycle: LifecycleController,
}

/// Connects to the runtime and builds the core components.
///
/// # Errors
///
/// Returns an error if the runtime backend or the generation client cannot
/// be initialised.
pub fn build(config: &DashboardConfig) -> anyhow::Result<Wiring> {
    let gateway = gateway::connect(config)
        .with_context(|| format!("failed to initialise the {} runtime backend", config.backend))?;

    let generator: Option<Arc<dyn TextGenerator>> = match &config.generation {
        Some(generation) => {
            let generator = AnthropicGenerator::new(generation.clone())?;
            tracing::info!(model = generator.model(), "description generation enabled");
            Some(Arc::new(generator))
        }
        None => {
            tracing::info!("no API key configured, descriptions fall back to labels and defaults");
            None
        }
    };

    let pending = Arc::new(PendingLabels::new());
    let descriptions = DescriptionProvider::new(generator, Arc::clone(&pending));
    Ok(Wiring {
        snapshots: SnapshotBuilder::new(Arc::clone(&gateway), descriptions, config.lan_host.clone()),
        lifecycle: LifecycleController::new(gateway, pending),
    })
}
