// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the catalog, the composition root, and the gateway.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A named contract that exported types may implement.
///
/// The composition root and business subsystems query the catalog by
/// capability to obtain every implementer. Contracts owned by business
/// subsystems that the core does not know about are carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Capability {
    Plugin,
    EntryPoint,
    WebSocketListener,
    ScheduledTask,
    ImageProvider,
    MetadataProvider,
    ConfigurationFactory,
    #[strum(default)]
    Other(String),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plugin => "Plugin",
            Self::EntryPoint => "EntryPoint",
            Self::WebSocketListener => "WebSocketListener",
            Self::ScheduledTask => "ScheduledTask",
            Self::ImageProvider => "ImageProvider",
            Self::MetadataProvider => "MetadataProvider",
            Self::ConfigurationFactory => "ConfigurationFactory",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// Which startup phase an entry point belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum StartupPhase {
    /// Must finish before the transport serves real traffic.
    PreStartup,
    /// Runs alongside live traffic.
    PostStartup,
}

/// Full status snapshot served to authenticated callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemInfo {
    pub version: String,
    pub product_name: String,
    pub server_name: String,
    pub id: String,
    pub operating_system: String,
    pub system_architecture: String,
    pub local_address: Option<String>,
    pub wan_address: Option<String>,
    pub http_server_port_number: u16,
    pub https_port_number: u16,
    pub supports_https: bool,
    pub has_pending_restart: bool,
    pub is_shutting_down: bool,
    pub can_self_restart: bool,
    pub has_update_available: bool,
    pub program_data_path: String,
    pub plugins_path: String,
}

/// The subset of [`SystemInfo`] that is safe to serve without authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicSystemInfo {
    pub version: String,
    pub product_name: String,
    pub server_name: String,
    pub id: String,
    pub operating_system: String,
    pub local_address: Option<String>,
    pub wan_address: Option<String>,
}

impl From<&SystemInfo> for PublicSystemInfo {
    fn from(info: &SystemInfo) -> Self {
        Self {
            version: info.version.clone(),
            product_name: info.product_name.clone(),
            server_name: info.server_name.clone(),
            id: info.id.clone(),
            operating_system: info.operating_system.clone(),
            local_address: info.local_address.clone(),
            wan_address: info.wan_address.clone(),
        }
    }
}
