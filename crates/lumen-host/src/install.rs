// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin hot-install: extending a running host with newly dropped modules.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use lumen_core::StartupPhase;
use lumen_plugin::{Module, ModuleOrigin, is_module_manifest, scan_plugin_directory};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::orchestrator::{PhaseReport, run_phase};
use crate::root::ApplicationHost;

/// Quiet period before a burst of file events is acted on.
pub const INSTALL_DEBOUNCE: Duration = Duration::from_millis(750);

/// How long shutdown waits for in-flight installs.
pub const INSTALL_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// What one hot-install pass added.
#[derive(Debug, Clone, Default)]
pub struct InstallOutcome {
    pub modules: usize,
    pub new_types: usize,
    pub plugins: Vec<String>,
    pub pre: Option<PhaseReport>,
    pub post: Option<PhaseReport>,
    /// Entry points handed to the startup pass that has not run yet.
    pub deferred_entry_points: usize,
}

impl InstallOutcome {
    pub fn entry_points_started(&self) -> usize {
        self.pre.iter().chain(&self.post).map(|r| r.outcomes.len()).sum()
    }
}

impl ApplicationHost {
    /// Loads the modules under `path` that the host has not seen yet and runs
    /// their entry points through both phases.
    ///
    /// Runs on its own task; the caller is never blocked. Shutdown waits for
    /// the task, so the returned handle may be dropped.
    ///
    /// Before startup has run, new entry points join the startup pass instead
    /// of running here. After shutdown has begun, nothing is installed.
    pub fn on_plugin_installed(self: &Arc<Self>, path: impl Into<PathBuf>) -> JoinHandle<InstallOutcome> {
        let host = self.clone();
        let path = path.into();
        self.installs.spawn(async move { host.install_from(&path).await })
    }

    async fn install_from(&self, path: &Path) -> InstallOutcome {
        if self.lifecycle.is_shutting_down() {
            debug!(path = %path.display(), "shutting down, install skipped");
            return InstallOutcome::default();
        }

        let modules = self.unseen_modules(path);
        if modules.is_empty() {
            debug!(path = %path.display(), "no new modules to install");
            return InstallOutcome::default();
        }

        let new_types = self.catalog.write().extend(&modules);
        let loaded = self.load_extensions(&new_types);
        let mut outcome = InstallOutcome {
            modules: modules.len(),
            new_types: new_types.len(),
            plugins: loaded.plugins.iter().map(|p| p.name.clone()).collect(),
            ..Default::default()
        };

        if !loaded.entry_points.is_empty() {
            let run_now = {
                let mut entry_points = self.entry_points.write();
                if self.entry_points_stopped.load(Ordering::Acquire) {
                    warn!(path = %path.display(), "entry points stopped, not starting installed entry points");
                    return outcome;
                }
                entry_points.extend(loaded.entry_points.iter().cloned());
                self.startup_begun.load(Ordering::Acquire)
            };
            if run_now {
                outcome.pre = Some(run_phase(StartupPhase::PreStartup, &loaded.entry_points).await);
                outcome.post = Some(run_phase(StartupPhase::PostStartup, &loaded.entry_points).await);
            } else {
                outcome.deferred_entry_points = loaded.entry_points.len();
                debug!(
                    count = outcome.deferred_entry_points,
                    "startup pending, installed entry points join it"
                );
            }
        }

        info!(
            path = %path.display(),
            modules = outcome.modules,
            plugins = ?outcome.plugins,
            entry_points = outcome.entry_points_started(),
            "plugin install complete"
        );
        outcome
    }

    fn unseen_modules(&self, path: &Path) -> Vec<Arc<dyn Module>> {
        let scanned = if path.is_file() && is_module_manifest(path) {
            path.parent().map(scan_plugin_directory).unwrap_or_default()
        } else {
            scan_plugin_directory(path)
        };

        let mut known = self.known_modules.lock();
        scanned
            .into_iter()
            .filter(|module| match module.origin() {
                ModuleOrigin::File(file) if known.contains(file) => false,
                ModuleOrigin::File(file) => match module.exported_types() {
                    // Left unknown so a rewritten manifest is picked up later.
                    Err(e) => {
                        warn!(path = %file.display(), error = %e, "module manifest unreadable, will retry");
                        false
                    }
                    Ok(_) => known.insert(file.clone()),
                },
                ModuleOrigin::Builtin => false,
            })
            .collect()
    }
}

/// Watches the plugins directory and hot-installs new module manifests.
///
/// Events are debounced; every directory that received a manifest during the
/// quiet period is installed once.
pub fn spawn_plugin_watcher(
    host: Arc<ApplicationHost>,
    dir: PathBuf,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>, notify::Error> {
    let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<notify::Event>>();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    std::fs::create_dir_all(&dir).map_err(notify::Error::io)?;
    watcher.watch(&dir, RecursiveMode::Recursive)?;
    info!(dir = %dir.display(), "watching plugin directory");

    Ok(tokio::spawn(async move {
        // Dropping the watcher stops event delivery.
        let _watcher = watcher;
        let mut dirty: HashSet<PathBuf> = HashSet::new();
        let mut deadline: Option<Instant> = None;

        loop {
            let wait = deadline;
            let sleep = async move {
                match wait {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending::<()>().await,
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(Ok(event)) => {
                        let manifests = event.paths.into_iter().filter(|p| is_module_manifest(p));
                        let mut touched = false;
                        for manifest in manifests {
                            if let Some(parent) = manifest.parent() {
                                dirty.insert(parent.to_path_buf());
                                touched = true;
                            }
                        }
                        if touched {
                            deadline = Some(Instant::now() + INSTALL_DEBOUNCE);
                        }
                    }
                    Some(Err(e)) => warn!(error = %e, "plugin directory watch error"),
                    None => break,
                },
                _ = sleep => {
                    deadline = None;
                    for path in dirty.drain() {
                        let _ = host.on_plugin_installed(path);
                    }
                }
            }
        }
        debug!("plugin watcher stopped");
    }))
}
