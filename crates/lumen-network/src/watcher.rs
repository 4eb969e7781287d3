// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background detection of network topology changes.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::addresses::interface_addresses;
use crate::locator::NetworkLocator;

fn snapshot(locator: &NetworkLocator) -> BTreeSet<IpAddr> {
    interface_addresses(locator.interfaces(), locator.ignore_virtual_interfaces())
        .into_iter()
        .collect()
}

/// Polls the interface list and clears the probe cache when it changes.
pub fn spawn_interface_watcher(
    locator: Arc<NetworkLocator>,
    every: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut known = snapshot(&locator);
        let mut interval = tokio::time::interval(every);
        // Skip the first immediate tick.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let current = snapshot(&locator);
                    if current != known {
                        info!(
                            before = known.len(),
                            after = current.len(),
                            "network interfaces changed"
                        );
                        locator.on_network_changed();
                        known = current;
                    } else {
                        debug!("network interfaces unchanged");
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("interface watcher shutting down");
                    break;
                }
            }
        }
    })
}
