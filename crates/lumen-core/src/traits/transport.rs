// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// What the transport layer actually bound at startup.
///
/// Configuration changes are compared against this to decide whether a
/// restart is required.
pub trait BoundTransport: Send + Sync {
    /// Registered URL prefixes, e.g. `http://+:8096/`.
    fn url_prefixes(&self) -> Vec<String>;

    /// `(http, https)` ports in effect.
    fn ports(&self) -> (u16, u16);
}
