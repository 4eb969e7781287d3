// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// An installable extension as seen by the plugin pipeline.
///
/// Identity, version, and the private data directory are assigned by the
/// pipeline after construction, so implementors only describe themselves.
pub trait Plugin: Send + Sync {
    /// Human-readable plugin name.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Plugin-declared identity. Used when the module manifest has no id.
    fn id(&self) -> Option<&str> {
        None
    }

    /// Plugins with a configuration page get their data directory created at load.
    fn has_configuration(&self) -> bool {
        false
    }
}
