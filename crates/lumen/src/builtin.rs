// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Components compiled into the server binary.
//!
//! They are exported through a built-in module so they go through the same
//! discovery and construction path as plugin code.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lumen_core::{
    Capability, Component, EntryPoint, LumenError, ServiceResolver, StartupPhase,
    WebSocketListener, WebSocketMessage,
};
use lumen_host::HostBuilder;
use lumen_network::NetworkLocator;
use lumen_plugin::{BuiltinModule, TypeDescriptor};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const ANNOUNCER: &str = "lumen.startup-announcer";
const KEEP_ALIVE: &str = "lumen.keep-alive";

/// Upper bound on the address lookups done while announcing.
const ANNOUNCE_TIMEOUT: Duration = Duration::from_secs(30);

/// The module describing every built-in export.
pub fn server_module() -> BuiltinModule {
    BuiltinModule::new("Lumen.Server", env!("CARGO_PKG_VERSION"))
        .export(
            TypeDescriptor::class("StartupAnnouncer")
                .with_capability(Capability::EntryPoint)
                .with_constructor(ANNOUNCER),
        )
        .export(
            TypeDescriptor::class("KeepAliveListener")
                .with_capability(Capability::WebSocketListener)
                .with_constructor(KEEP_ALIVE),
        )
}

/// Adds the built-in module and its constructors to `builder`.
pub fn register(builder: HostBuilder) -> HostBuilder {
    builder
        .with_module(Arc::new(server_module()))
        .with_factory(ANNOUNCER, |resolver: &ServiceResolver| {
            let locator = resolver.resolve::<NetworkLocator>()?;
            Ok(Arc::new(StartupAnnouncer { locator }) as Arc<dyn Component>)
        })
        .with_factory(KEEP_ALIVE, |_: &ServiceResolver| {
            Ok(Arc::new(KeepAliveListener) as Arc<dyn Component>)
        })
}

/// Logs where the server can be reached once it is serving.
pub struct StartupAnnouncer {
    locator: Arc<NetworkLocator>,
}

#[async_trait]
impl EntryPoint for StartupAnnouncer {
    fn name(&self) -> &str {
        "startup-announcer"
    }

    fn phase(&self) -> StartupPhase {
        StartupPhase::PostStartup
    }

    async fn run(&self) -> Result<(), LumenError> {
        let cancel = CancellationToken::new();
        let lookup = async {
            let local = self.locator.local_api_url(&cancel).await?;
            let wan = self.locator.wan_api_url(&cancel).await?;
            Ok::<_, LumenError>((local, wan))
        };

        match tokio::time::timeout(ANNOUNCE_TIMEOUT, lookup).await {
            Ok(result) => {
                let (local, wan) = result?;
                info!(
                    local = local.as_deref().unwrap_or("unavailable"),
                    wan = wan.as_deref().unwrap_or("unavailable"),
                    "server addresses"
                );
            }
            Err(_) => {
                cancel.cancel();
                warn!(timeout = ?ANNOUNCE_TIMEOUT, "address lookup did not finish");
            }
        }
        Ok(())
    }
}

impl Component for StartupAnnouncer {
    fn as_entry_point(self: Arc<Self>) -> Option<Arc<dyn EntryPoint>> {
        Some(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SocketEnvelope {
    message_type: String,
}

/// Answers client keep-alive frames so idle sockets are not dropped.
pub struct KeepAliveListener;

#[async_trait]
impl WebSocketListener for KeepAliveListener {
    fn name(&self) -> &str {
        "keep-alive"
    }

    async fn process_message(
        &self,
        message: &WebSocketMessage,
    ) -> Result<Option<String>, LumenError> {
        // Frames for other listeners are not ours to reject.
        let Ok(envelope) = serde_json::from_str::<SocketEnvelope>(&message.text) else {
            return Ok(None);
        };
        if envelope.message_type != "KeepAlive" {
            return Ok(None);
        }

        debug!(connection = %message.connection_id, "keep-alive");
        let reply = serde_json::to_string(&SocketEnvelope {
            message_type: "KeepAlive".into(),
        })
        .map_err(|e| LumenError::Internal(format!("failed to encode keep-alive: {e}")))?;
        Ok(Some(reply))
    }
}

impl Component for KeepAliveListener {
    fn as_websocket_listener(self: Arc<Self>) -> Option<Arc<dyn WebSocketListener>> {
        Some(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
