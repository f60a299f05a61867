//! # dockboard-core
//!
//! The snapshot and lifecycle layer of the dashboard.
//!
//! - **Ports**: binding tables → deduplicated mappings and a primary URL.
//! - **Descriptions**: label cache, text generation, default fallback.
//! - **Snapshots**: the per-request presentation record of a container.
//! - **Lifecycle**: start/stop/restart and the pull-and-recreate update,
//!   serialized per container.
//!
//! Nothing here holds container state between calls; every operation
//! re-reads the runtime through a [`dockboard_runtime::gateway::RuntimeGateway`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod description;
pub mod generator;
pub mod lifecycle;
pub mod lock;
pub mod pending;
pub mod ports;
pub mod snapshot;
