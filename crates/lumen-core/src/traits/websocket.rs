// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::LumenError;

/// A text frame received on an upgraded connection.
#[derive(Debug, Clone)]
pub struct WebSocketMessage {
    pub connection_id: String,
    pub remote_addr: Option<String>,
    pub text: String,
}

/// Receives frames from every upgraded connection on the front door.
#[async_trait]
pub trait WebSocketListener: Send + Sync {
    fn name(&self) -> &str;

    /// Handles one frame. A returned string is sent back on the same connection.
    async fn process_message(
        &self,
        message: &WebSocketMessage,
    ) -> Result<Option<String>, LumenError>;
}
