// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.
//!
//! Every problem is collected; validation never stops at the first one.

use std::net::IpAddr;

use crate::diagnostic::ConfigError;
use crate::model::LumenConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

pub fn validate_config(config: &LumenConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let network = &config.network;

    if network.bind_address.trim().parse::<IpAddr>().is_err() {
        errors.push(ConfigError::validation(format!(
            "network.bind_address `{}` is not a valid IP address",
            network.bind_address
        )));
    }

    for (key, port) in [
        ("http_port", network.http_port),
        ("https_port", network.https_port),
        ("public_port", network.public_port),
        ("public_https_port", network.public_https_port),
    ] {
        if port == 0 {
            errors.push(ConfigError::validation(format!(
                "network.{key} must be between 1 and 65535"
            )));
        }
    }

    if network.probe_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "network.probe_timeout_secs must be at least 1",
        ));
    }

    if network.interface_poll_secs == 0 {
        errors.push(ConfigError::validation(
            "network.interface_poll_secs must be at least 1",
        ));
    }

    if network.certificate_password.is_some() && network.certificate_path.is_none() {
        errors.push(ConfigError::validation(
            "network.certificate_password is set but network.certificate_path is not",
        ));
    }

    if !network.wan_lookup_url.starts_with("http://")
        && !network.wan_lookup_url.starts_with("https://")
    {
        errors.push(ConfigError::validation(format!(
            "network.wan_lookup_url `{}` must be an http or https URL",
            network.wan_lookup_url
        )));
    }

    if config.paths.program_data_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "paths.program_data_path must not be empty",
        ));
    }

    let level = config.server.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.log_level `{}` must be one of: {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
