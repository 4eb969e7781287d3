// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::error::LumenError;

/// A component that holds resources released at host teardown.
pub trait Disposable: Send + Sync {
    /// Releases held resources. Called at most once by the host.
    fn dispose(&self) -> Result<(), LumenError>;
}
