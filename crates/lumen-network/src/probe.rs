// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reachability probe results keyed by probe URL.

use dashmap::DashMap;

/// Path every host answers with its product name.
pub const PING_PATH: &str = "/system/ping";

/// Probe URL for a base URL such as `http://10.0.0.2:8096`.
pub fn probe_url(base_url: &str) -> String {
    format!("{base_url}{PING_PATH}")
}

/// Cached reachability results.
///
/// Keys are compared case-insensitively. Entries live until the next network
/// topology change clears the whole cache.
#[derive(Debug, Default)]
pub struct AddressProbeCache {
    results: DashMap<String, bool>,
}

impl AddressProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<bool> {
        self.results.get(&url.to_ascii_lowercase()).map(|entry| *entry)
    }

    pub fn insert(&self, url: &str, reachable: bool) {
        self.results.insert(url.to_ascii_lowercase(), reachable);
    }

    pub fn clear(&self) {
        self.results.clear();
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
