// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Lumen media host.
//!
//! This crate provides the error type, the component contracts every
//! extension implements, the singleton [`ServiceResolver`], and the lifecycle
//! signals shared by the host, the gateway, and the network services.

pub mod error;
pub mod resolver;
pub mod signal;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LumenError;
pub use resolver::{Deferred, ServiceResolver};
pub use signal::{EdgeTriggeredFlag, ReadinessGate};
pub use types::{Capability, PublicSystemInfo, StartupPhase, SystemInfo};

pub use traits::{
    BoundTransport, Component, Disposable, EntryPoint, Export, Plugin, WebSocketListener,
    WebSocketMessage,
};

/// Product name answered by `/system/ping` and expected back by reachability probes.
pub const PRODUCT_NAME: &str = "Lumen Server";
