// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen serve` command implementation.
//!
//! Composes the host, opens the front door, runs the startup phases, and
//! watches the plugin directory. The host is torn down on a shutdown signal
//! or when its lifetime ends; a requested restart composes a fresh host from
//! reloaded configuration in the same process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumen_config::LumenConfig;
use lumen_core::LumenError;
use lumen_host::{ApplicationHost, HostBuilder, install_signal_handler, spawn_plugin_watcher};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::builtin;

/// Runs `lumen serve` until a shutdown signal arrives.
pub async fn run_serve(config: LumenConfig, config_path: Option<PathBuf>) -> Result<(), LumenError> {
    init_tracing(&config.server.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting lumen serve");

    let signal = install_signal_handler();
    let mut config = config;
    loop {
        let restart = serve_once(config, &signal).await?;
        if !restart {
            info!("lumen serve stopped");
            return Ok(());
        }
        info!("restarting host");
        config = reload(config_path.as_deref())?;
    }
}

/// Composes the host with the built-in components.
pub async fn compose(config: LumenConfig) -> Result<Arc<ApplicationHost>, LumenError> {
    builtin::register(HostBuilder::new(config)).build().await
}

/// One host lifetime. Returns whether a restart was requested.
async fn serve_once(config: LumenConfig, signal: &CancellationToken) -> Result<bool, LumenError> {
    let plugins_dir = config.paths.plugins_dir();
    let host = compose(config).await?;
    let lifetime = host.lifecycle().lifetime();

    let mut server = match host.serve() {
        Ok(server) => server,
        Err(e) => {
            host.dispose();
            return Err(e);
        }
    };

    let watcher = match spawn_plugin_watcher(host.clone(), plugins_dir.clone(), lifetime.clone()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(dir = %plugins_dir.display(), error = %e, "plugin directory watch unavailable, hot-install disabled");
            None
        }
    };

    let mut server_result = None;
    tokio::select! {
        _ = host.run_startup_tasks() => {}
        _ = signal.cancelled() => {}
        result = &mut server => server_result = Some(result),
    }

    if server_result.is_none() && !signal.is_cancelled() && !lifetime.is_cancelled() {
        tokio::select! {
            _ = signal.cancelled() => info!("shutdown signal received"),
            _ = lifetime.cancelled() => info!("host lifetime ended"),
            result = &mut server => server_result = Some(result),
        }
    }

    host.shutdown().await;
    let result = match server_result {
        Some(result) => result,
        None => server.await,
    };
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "front door failed"),
        Err(e) => error!(error = %e, "front door task panicked"),
    }
    if let Some(watcher) = watcher {
        let _ = watcher.await;
    }

    if let Some(report) = host.dispose()
        && !report.failed.is_empty()
    {
        warn!(failed = ?report.failed, "some components failed to dispose");
    }

    Ok(host.lifecycle().restart_requested() && !signal.is_cancelled())
}

fn reload(config_path: Option<&Path>) -> Result<LumenConfig, LumenError> {
    let loaded = match config_path {
        Some(path) => lumen_config::load_and_validate_path(path),
        None => lumen_config::load_and_validate(),
    };
    loaded.map_err(|errors| {
        lumen_config::render_errors(&errors);
        LumenError::Config(format!("{} configuration error(s) on restart", errors.len()))
    })
}

/// Initializes the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lumen={log_level},warn")));

    // A second restart cycle must not panic on an already set subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn test_config(dir: &Path) -> LumenConfig {
        let mut config = LumenConfig::default();
        config.paths.program_data_path = dir.display().to_string();
        config.network.bind_address = "127.0.0.1".into();
        config.network.http_port = 0;
        config.network.https_port = 18922;
        config.network.wan_ddns = Some("media.example.org".into());
        config
    }

    #[tokio::test]
    async fn signal_stops_the_host_without_restart() {
        let dir = tempfile::tempdir().unwrap();
        let signal = CancellationToken::new();
        let run = tokio::spawn({
            let signal = signal.clone();
            let config = test_config(dir.path());
            async move { serve_once(config, &signal).await }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        signal.cancel();
        let restart = tokio::time::timeout(Duration::from_secs(10), run)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(!restart);
    }

    #[test]
    fn reload_reports_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumen.toml");
        std::fs::write(&path, "[network]\nhttp_prot = 80\n").unwrap();
        assert!(matches!(reload(Some(&path)), Err(LumenError::Config(_))));
    }
}
