// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::LumenError;
use crate::types::StartupPhase;

/// A hook run once when the host starts and once when it stops.
#[async_trait]
pub trait EntryPoint: Send + Sync {
    /// Name used in startup logs and phase reports.
    fn name(&self) -> &str;

    /// Entry points default to running after the transport opens.
    fn phase(&self) -> StartupPhase {
        StartupPhase::PostStartup
    }

    async fn run(&self) -> Result<(), LumenError>;

    async fn shutdown(&self) -> Result<(), LumenError> {
        Ok(())
    }
}
