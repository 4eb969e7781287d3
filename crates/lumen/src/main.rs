// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lumen - a self-hosted media server host.
//!
//! This is the binary entry point.

mod builtin;
mod plugins;
mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lumen_config::LumenConfig;

/// Lumen - a self-hosted media server host.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about, long_about = None)]
struct Cli {
    /// Load this configuration file instead of the standard hierarchy.
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the server. The default when no subcommand is given.
    Serve,
    /// Ask a running server for its status.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Inspect the plugin directory.
    #[command(subcommand)]
    Plugins(PluginsCommand),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum ConfigCommand {
    /// Print the effective configuration as TOML.
    Show,
    /// Check the configuration and report every error.
    Validate,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum PluginsCommand {
    /// List module manifests found in the plugin directory.
    List,
}

fn load_config(path: Option<&PathBuf>) -> LumenConfig {
    let loaded = match path {
        Some(path) => lumen_config::load_and_validate_path(path),
        None => lumen_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            lumen_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config, cli.config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Status { json } => {
            if let Err(e) = status::run_status(&config, json).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Config(ConfigCommand::Show) => match config.to_toml() {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        Commands::Config(ConfigCommand::Validate) => {
            println!("configuration is valid");
        }
        Commands::Plugins(PluginsCommand::List) => plugins::run_list(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["lumen"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["lumen", "plugins", "list", "--config", "/srv/lumen.toml"])
            .unwrap();
        assert_eq!(cli.command, Some(Commands::Plugins(PluginsCommand::List)));
        assert_eq!(cli.config, Some(PathBuf::from("/srv/lumen.toml")));
    }

    #[test]
    fn status_accepts_json() {
        let cli = Cli::try_parse_from(["lumen", "status", "--json"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Status { json: true }));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["lumen", "shell"]).is_err());
    }

    #[test]
    fn default_config_is_valid() {
        let config = lumen_config::load_and_validate_str("").expect("defaults should validate");
        assert_eq!(config.network.http_port, 8096);
    }
}
