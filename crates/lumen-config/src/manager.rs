// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live configuration accessor with change notification.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;

use crate::diagnostic::ConfigError;
use crate::model::LumenConfig;
use crate::validation::validate_config;

/// Published on every successful [`ConfigurationManager::update`].
#[derive(Debug, Clone)]
pub struct ConfigChange {
    pub previous: Arc<LumenConfig>,
    pub current: Arc<LumenConfig>,
}

/// Holds the current configuration snapshot.
///
/// Readers get a cheap `Arc` snapshot. Writers replace the whole snapshot and
/// subscribers receive both the old and the new value.
pub struct ConfigurationManager {
    current: ArcSwap<LumenConfig>,
    changes: broadcast::Sender<ConfigChange>,
}

impl ConfigurationManager {
    pub fn new(config: LumenConfig) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            current: ArcSwap::from_pointee(config),
            changes,
        }
    }

    pub fn current(&self) -> Arc<LumenConfig> {
        self.current.load_full()
    }

    /// Validates and installs a new configuration, then notifies subscribers.
    pub fn update(&self, config: LumenConfig) -> Result<(), Vec<ConfigError>> {
        validate_config(&config)?;
        let current = Arc::new(config);
        let previous = self.current.swap(current.clone());
        tracing::info!("configuration updated");
        // Nobody listening is fine.
        let _ = self.changes.send(ConfigChange { previous, current });
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConfigChange> {
        self.changes.subscribe()
    }
}

impl std::fmt::Debug for ConfigurationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationManager")
            .field("subscribers", &self.changes.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_publishes_previous_and_current() {
        let manager = ConfigurationManager::new(LumenConfig::default());
        let mut rx = manager.subscribe();

        let mut next = LumenConfig::default();
        next.network.http_port = 9096;
        manager.update(next).unwrap();

        let change = rx.try_recv().unwrap();
        assert_eq!(change.previous.network.http_port, 8096);
        assert_eq!(change.current.network.http_port, 9096);
        assert_eq!(manager.current().network.http_port, 9096);
    }

    #[test]
    fn invalid_update_keeps_current_snapshot() {
        let manager = ConfigurationManager::new(LumenConfig::default());
        let mut rx = manager.subscribe();

        let mut bad = LumenConfig::default();
        bad.network.http_port = 0;
        assert!(manager.update(bad).is_err());

        assert_eq!(manager.current().network.http_port, 8096);
        assert!(rx.try_recv().is_err());
    }
}
