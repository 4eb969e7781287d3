// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host lifecycle flags: shutdown, restart requests, and pending notices.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lumen_config::LumenConfig;
use lumen_core::{EdgeTriggeredFlag, LumenError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Name reported when neither the configuration nor the OS provides one.
const FALLBACK_SERVER_NAME: &str = "lumen";

/// Shutdown and restart state of one host instance.
#[derive(Debug)]
pub struct Lifecycle {
    can_self_restart: bool,
    shutting_down: AtomicBool,
    restart_requested: AtomicBool,
    pending_restart: Arc<EdgeTriggeredFlag>,
    update_available: EdgeTriggeredFlag,
    lifetime: CancellationToken,
}

impl Lifecycle {
    pub fn new(can_self_restart: bool, pending_restart: Arc<EdgeTriggeredFlag>) -> Self {
        Self {
            can_self_restart,
            shutting_down: AtomicBool::new(false),
            restart_requested: AtomicBool::new(false),
            pending_restart,
            update_available: EdgeTriggeredFlag::new("update-available"),
            lifetime: CancellationToken::new(),
        }
    }

    /// Cancelled when the host begins shutting down for any reason.
    pub fn lifetime(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    pub fn can_self_restart(&self) -> bool {
        self.can_self_restart
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    pub fn restart_requested(&self) -> bool {
        self.restart_requested.load(Ordering::Acquire)
    }

    /// Marks the host as shutting down. Returns `true` for the first caller.
    pub fn begin_shutdown(&self) -> bool {
        let first = self
            .shutting_down
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.lifetime.cancel();
        }
        first
    }

    /// Asks the serve loop to tear this host down and build a new one.
    ///
    /// Returns `Ok(false)` when a shutdown is already under way.
    pub fn request_restart(&self) -> Result<bool, LumenError> {
        if !self.can_self_restart {
            return Err(LumenError::RestartUnsupported(
                "this host is not allowed to restart itself".into(),
            ));
        }
        if self.is_shutting_down() {
            debug!("restart requested while already shutting down");
            return Ok(false);
        }
        self.restart_requested.store(true, Ordering::Release);
        info!("restart requested");
        Ok(self.begin_shutdown())
    }

    pub fn notify_pending_restart(&self) -> bool {
        self.pending_restart.raise()
    }

    pub fn has_pending_restart(&self) -> bool {
        self.pending_restart.is_raised()
    }

    pub fn pending_restart_flag(&self) -> &Arc<EdgeTriggeredFlag> {
        &self.pending_restart
    }

    pub fn notify_update_available(&self) -> bool {
        self.update_available.raise()
    }

    pub fn has_update_available(&self) -> bool {
        self.update_available.is_raised()
    }

    pub fn update_available_flag(&self) -> &EdgeTriggeredFlag {
        &self.update_available
    }
}

/// Configured server name, else the machine hostname.
pub fn server_name(config: &LumenConfig) -> String {
    config
        .server
        .server_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| {
            hostname::get()
                .ok()
                .map(|name| name.to_string_lossy().into_owned())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| FALLBACK_SERVER_NAME.to_string())
}
