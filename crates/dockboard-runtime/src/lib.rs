//! Runtime gateways for the Dockboard dashboard.
//!
//! Every backend implements [`gateway::RuntimeGateway`] and normalizes
//! what the runtime reports into [`dockboard_common::types::Container`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod convert;
pub mod gateway;
pub mod parse;
pub mod process;
