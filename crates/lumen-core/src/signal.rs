// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide lifecycle signals.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, watch};

/// A boolean whose subscribers are notified only on its false to true transition.
///
/// Raising an already raised flag is a no-op. The transition and the
/// notification are decided by one compare-exchange, so concurrent raisers
/// produce exactly one notification.
#[derive(Debug)]
pub struct EdgeTriggeredFlag {
    name: &'static str,
    raised: AtomicBool,
    notify: broadcast::Sender<()>,
}

impl EdgeTriggeredFlag {
    pub fn new(name: &'static str) -> Self {
        let (notify, _) = broadcast::channel(4);
        Self {
            name,
            raised: AtomicBool::new(false),
            notify,
        }
    }

    /// Raises the flag. Returns `true` if this call performed the transition.
    pub fn raise(&self) -> bool {
        if self
            .raised
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        tracing::info!(flag = self.name, "flag raised");
        // No subscribers is fine.
        let _ = self.notify.send(());
        true
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Receives one message per false to true transition.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Clears the flag so a later raise notifies again.
    pub fn reset(&self) {
        self.raised.store(false, Ordering::Release);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Closed until the pre-startup phase finishes. Never closes again.
#[derive(Debug)]
pub struct ReadinessGate {
    state: watch::Sender<bool>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    pub fn open(&self) {
        if !self.state.send_replace(true) {
            tracing::debug!("readiness gate opened");
        }
    }

    pub fn is_open(&self) -> bool {
        *self.state.borrow()
    }

    /// Completes once the gate is open.
    pub async fn wait_open(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}
