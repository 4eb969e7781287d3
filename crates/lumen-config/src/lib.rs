// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Lumen host.
//!
//! Provides layered TOML loading with strict key checking, environment
//! overrides, miette diagnostics with typo suggestions, and a live
//! [`ConfigurationManager`] that publishes change events.
//!
//! ```no_run
//! use lumen_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("http port: {}", config.network.http_port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod manager;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use manager::{ConfigChange, ConfigurationManager};
pub use model::{LumenConfig, NetworkConfig, PathsConfig, ServerConfig};

/// Loads the standard hierarchy and validates the result.
pub fn load_and_validate() -> Result<LumenConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Loads one explicit file plus environment overrides and validates the result.
pub fn load_and_validate_path(path: &std::path::Path) -> Result<LumenConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

/// Loads inline TOML and validates the result.
pub fn load_and_validate_str(toml_content: &str) -> Result<LumenConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

fn finish(loaded: Result<LumenConfig, figment::Error>) -> Result<LumenConfig, Vec<ConfigError>> {
    let config = loaded.map_err(diagnostic::figment_to_config_errors)?;
    validation::validate_config(&config)?;
    Ok(config)
}
