// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Lumen integration tests.
//!
//! Provides mock collaborators and a host harness for fast, deterministic,
//! CI-runnable tests without real network interfaces or remote hosts.
//!
//! # Components
//!
//! - [`MockProbeClient`] - scripted reachability and WAN lookup responses
//! - [`FakeInterfaces`] - fixed interface list
//! - [`RecordingEntryPoint`], [`RecordingDisposable`], [`MockPlugin`] - components
//!   that record what the host did to them
//! - [`TestHost`] - a host on a temporary program data directory

pub mod components;
pub mod harness;
pub mod mock_network;

pub use components::{CallLog, Hold, MockPlugin, RecordingDisposable, RecordingEntryPoint};
pub use harness::{TestHost, TestHostBuilder};
pub use mock_network::{FakeInterfaces, MockProbeClient};
