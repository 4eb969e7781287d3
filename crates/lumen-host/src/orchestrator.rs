// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-phase concurrent startup and shutdown of entry points.
//!
//! Every entry point of a phase gets its own task. A phase is complete only
//! when all of its tasks have settled; failures are logged and recorded but
//! never cancel siblings or later phases.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use lumen_core::{EntryPoint, ReadinessGate, StartupPhase};
use tracing::{error, info};

/// How one entry point finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPointOutcome {
    Started,
    StartedWithError(String),
}

/// Per-entry-point outcomes of one phase.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub label: String,
    pub outcomes: Vec<(String, EntryPointOutcome)>,
    pub elapsed: Duration,
}

impl PhaseReport {
    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, EntryPointOutcome::StartedWithError(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.outcomes.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Both startup phases.
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub pre: PhaseReport,
    pub post: PhaseReport,
}

async fn run_concurrently<F, Fut>(
    label: String,
    entries: Vec<Arc<dyn EntryPoint>>,
    action: F,
) -> PhaseReport
where
    F: Fn(Arc<dyn EntryPoint>) -> Fut,
    Fut: std::future::Future<Output = Result<(), lumen_core::LumenError>> + Send + 'static,
{
    let started = Instant::now();
    let names: Vec<String> = entries.iter().map(|e| e.name().to_string()).collect();
    let handles: Vec<_> = entries.into_iter().map(|e| tokio::spawn(action(e))).collect();

    let outcomes = join_all(handles)
        .await
        .into_iter()
        .zip(names)
        .map(|(joined, name)| {
            let outcome = match joined {
                Ok(Ok(())) => EntryPointOutcome::Started,
                Ok(Err(e)) => {
                    error!(entry_point = %name, phase = %label, error = %e, "error in entry point");
                    EntryPointOutcome::StartedWithError(e.to_string())
                }
                Err(join_error) => {
                    error!(entry_point = %name, phase = %label, error = %join_error, "entry point task panicked");
                    EntryPointOutcome::StartedWithError(join_error.to_string())
                }
            };
            (name, outcome)
        })
        .collect();

    let elapsed = started.elapsed();
    info!(phase = %label, elapsed_ms = elapsed.as_millis() as u64, "all entry points have started");
    PhaseReport {
        label,
        outcomes,
        elapsed,
    }
}

/// Runs `run()` on every entry point that belongs to `phase`.
pub async fn run_phase(phase: StartupPhase, entries: &[Arc<dyn EntryPoint>]) -> PhaseReport {
    let selected: Vec<_> = entries
        .iter()
        .filter(|e| e.phase() == phase)
        .cloned()
        .collect();
    run_concurrently(phase.to_string(), selected, |entry| async move {
        info!(entry_point = entry.name(), "starting entry point");
        entry.run().await
    })
    .await
}

/// Pre-startup, then the readiness gate, then post-startup.
pub async fn run_startup(entries: &[Arc<dyn EntryPoint>], gate: &ReadinessGate) -> StartupReport {
    let pre = run_phase(StartupPhase::PreStartup, entries).await;
    gate.open();
    let post = run_phase(StartupPhase::PostStartup, entries).await;
    StartupReport { pre, post }
}

/// Calls `shutdown()` on every entry point concurrently.
pub async fn run_shutdown(entries: &[Arc<dyn EntryPoint>]) -> PhaseReport {
    run_concurrently("shutdown".to_string(), entries.to_vec(), |entry| async move {
        entry.shutdown().await
    })
    .await
}
