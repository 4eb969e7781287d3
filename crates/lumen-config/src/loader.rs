// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Later layers override earlier ones:
//! 1. Compiled defaults
//! 2. `/etc/lumen/lumen.toml`
//! 3. `~/.config/lumen/lumen.toml`
//! 4. `./lumen.toml`
//! 5. `LUMEN_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LumenConfig;

/// Config file locations in merge order, lowest precedence first.
pub fn config_file_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/lumen/lumen.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("lumen/lumen.toml"));
    }
    paths.push(PathBuf::from("lumen.toml"));
    paths
}

/// Figment for the standard hierarchy, before extraction.
pub fn build_figment() -> Figment {
    config_file_paths()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(LumenConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

pub fn load_config() -> Result<LumenConfig, figment::Error> {
    build_figment().extract()
}

/// Loads a single explicit file plus environment overrides.
pub fn load_config_from_path(path: &Path) -> Result<LumenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LumenConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Loads inline TOML over the defaults. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<LumenConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LumenConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// `LUMEN_NETWORK_HTTP_PORT` becomes `network.http_port`.
///
/// Only the section prefix is mapped to a dot, so underscores inside key
/// names survive.
fn env_provider() -> Env {
    Env::prefixed("LUMEN_").map(|key| {
        let key = key.as_str();
        ["server_", "network_", "paths_", "plugins_"]
            .iter()
            .find(|section| key.starts_with(*section))
            .map(|section| key.replacen(section, &section.replace('_', "."), 1))
            .unwrap_or_else(|| key.to_string())
            .into()
    })
}
