//! # dockboard-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the entire Dockboard workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the container model that the runtime
//! gateways produce and the core orchestration layer consumes.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
