// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition root and lifecycle of the Lumen host.
//!
//! [`HostBuilder`] discovers modules, evaluates the staged service graph,
//! binds the front door, and loads plugins into an [`ApplicationHost`]. The
//! host then sequences two-phase startup of entry points, accepts plugins
//! installed while running, and tears everything down in a fixed order.

pub mod disposal;
pub mod graph;
pub mod install;
pub mod orchestrator;
pub mod root;
pub mod shutdown;
pub mod status;
pub mod system_id;

pub use disposal::{DisposalReport, DisposalTracker};
pub use graph::{ServiceGraph, Stage};
pub use install::{INSTALL_DEBOUNCE, INSTALL_DRAIN_TIMEOUT, InstallOutcome, spawn_plugin_watcher};
pub use orchestrator::{
    EntryPointOutcome, PhaseReport, StartupReport, run_phase, run_shutdown, run_startup,
};
pub use root::{ApplicationHost, HostBuilder, Repository};
pub use shutdown::install_signal_handler;
pub use status::{Lifecycle, server_name};
pub use system_id::SystemId;
