// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the Lumen host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default plaintext listener port.
pub const DEFAULT_HTTP_PORT: u16 = 8096;

/// Default TLS listener port.
pub const DEFAULT_HTTPS_PORT: u16 = 8920;

/// Top-level Lumen configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LumenConfig {
    /// Server identity and logging.
    #[serde(default)]
    pub server: ServerConfig,

    /// Ports, certificates, and address discovery.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Program data and plugin directories.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Per-plugin enable switches keyed by plugin name. Plugins not listed are enabled.
    #[serde(default)]
    pub plugins: HashMap<String, bool>,
}

impl LumenConfig {
    /// Whether the named plugin may join the live plugin set.
    pub fn plugin_enabled(&self, name: &str) -> bool {
        self.plugins.get(name).copied().unwrap_or(true)
    }

    /// Effective configuration rendered back to TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Friendly name shown to clients. Falls back to the machine hostname.
    #[serde(default)]
    pub server_name: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether the serve loop may restart the host in-process.
    #[serde(default = "default_true")]
    pub allow_self_restart: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: None,
            log_level: default_log_level(),
            allow_self_restart: true,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Network configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Address the front door binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_https_port")]
    pub https_port: u16,

    /// Port advertised in the WAN URL for plaintext.
    #[serde(default = "default_http_port")]
    pub public_port: u16,

    /// Port advertised in the WAN URL for TLS.
    #[serde(default = "default_https_port")]
    pub public_https_port: u16,

    /// Request HTTPS. Only takes effect when a usable certificate exists or
    /// the host sits behind a reverse proxy.
    #[serde(default)]
    pub enable_https: bool,

    /// A reverse proxy terminates TLS in front of this host.
    #[serde(default)]
    pub is_behind_proxy: bool,

    /// Custom PKCS#12 certificate. When unset a self-signed path is derived.
    #[serde(default)]
    pub certificate_path: Option<String>,

    #[serde(default)]
    pub certificate_password: Option<String>,

    /// Externally visible hostname (dynamic DNS). When unset the WAN address
    /// is looked up from `wan_lookup_url`.
    #[serde(default)]
    pub wan_ddns: Option<String>,

    /// Overrides interface enumeration. Entries may be bare IPs or URL-ish
    /// strings such as `http://192.168.1.4/`.
    #[serde(default)]
    pub local_network_addresses: Vec<String>,

    /// Skip docker, veth, bridge, and tunnel interfaces during enumeration.
    #[serde(default = "default_true")]
    pub ignore_virtual_interfaces: bool,

    /// Per-probe timeout for `/system/ping`.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// How often the interface list is polled for topology changes.
    #[serde(default = "default_interface_poll_secs")]
    pub interface_poll_secs: u64,

    #[serde(default = "default_wan_lookup_url")]
    pub wan_lookup_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: DEFAULT_HTTP_PORT,
            https_port: DEFAULT_HTTPS_PORT,
            public_port: DEFAULT_HTTP_PORT,
            public_https_port: DEFAULT_HTTPS_PORT,
            enable_https: false,
            is_behind_proxy: false,
            certificate_path: None,
            certificate_password: None,
            wan_ddns: None,
            local_network_addresses: Vec::new(),
            ignore_virtual_interfaces: true,
            probe_timeout_secs: default_probe_timeout_secs(),
            interface_poll_secs: default_interface_poll_secs(),
            wan_lookup_url: default_wan_lookup_url(),
        }
    }
}

impl NetworkConfig {
    /// Ports actually bound. Identical ports fall back to the defaults.
    pub fn effective_ports(&self) -> (u16, u16) {
        if self.http_port == self.https_port {
            (DEFAULT_HTTP_PORT, DEFAULT_HTTPS_PORT)
        } else {
            (self.http_port, self.https_port)
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

fn default_https_port() -> u16 {
    DEFAULT_HTTPS_PORT
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_interface_poll_secs() -> u64 {
    30
}

fn default_wan_lookup_url() -> String {
    "http://ipv4.icanhazip.com".to_string()
}

/// Filesystem layout.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PathsConfig {
    /// Root for certificates, the device id, and plugin data.
    #[serde(default = "default_program_data_path")]
    pub program_data_path: String,

    /// Plugin directory. Defaults to `{program_data_path}/plugins`.
    #[serde(default)]
    pub plugins_path: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            program_data_path: default_program_data_path(),
            plugins_path: None,
        }
    }
}

impl PathsConfig {
    pub fn program_data_dir(&self) -> PathBuf {
        PathBuf::from(&self.program_data_path)
    }

    pub fn plugins_dir(&self) -> PathBuf {
        match &self.plugins_path {
            Some(path) => PathBuf::from(path),
            None => self.program_data_dir().join("plugins"),
        }
    }

    pub fn ssl_dir(&self) -> PathBuf {
        self.program_data_dir().join("ssl")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.program_data_dir().join("data")
    }
}

fn default_program_data_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("lumen"))
        .unwrap_or_else(|| PathBuf::from(".lumen"))
        .display()
        .to_string()
}
