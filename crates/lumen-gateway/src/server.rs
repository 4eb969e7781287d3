// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Listener binding and the axum server loop.

use std::net::SocketAddr;

use axum::Router;
use lumen_core::{BoundTransport, LumenError};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::front_door::{FrontDoorState, front_door};

/// Listener settings derived from the host configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    pub http_port: u16,
    pub https_port: u16,
    /// Prefixes registered at bind time, see `lumen_network::url_prefixes`.
    pub url_prefixes: Vec<String>,
}

/// Ports and prefixes that were actually bound.
#[derive(Debug, Clone)]
pub struct GatewayTransport {
    ports: (u16, u16),
    url_prefixes: Vec<String>,
    local_addr: SocketAddr,
}

impl GatewayTransport {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl BoundTransport for GatewayTransport {
    fn url_prefixes(&self) -> Vec<String> {
        self.url_prefixes.clone()
    }

    fn ports(&self) -> (u16, u16) {
        self.ports
    }
}

/// Binds the shared listener.
///
/// Binding is synchronous so it can run inside a registration stage; it must
/// still be called from within a tokio runtime.
pub fn bind(config: &ServerConfig) -> Result<(TcpListener, GatewayTransport), LumenError> {
    let addr = format!("{}:{}", config.host, config.http_port);
    let bind_error = |e: std::io::Error| LumenError::Network {
        message: format!("failed to bind front door to {addr}: {e}"),
        source: Some(Box::new(e)),
    };
    let std_listener = std::net::TcpListener::bind(&addr).map_err(bind_error)?;
    std_listener.set_nonblocking(true).map_err(bind_error)?;
    let listener = TcpListener::from_std(std_listener).map_err(bind_error)?;
    let local_addr = listener.local_addr()?;

    tracing::info!(%local_addr, prefixes = ?config.url_prefixes, "front door listening");

    Ok((
        listener,
        GatewayTransport {
            ports: (config.http_port, config.https_port),
            url_prefixes: config.url_prefixes.clone(),
            local_addr,
        },
    ))
}

/// Single fallback route plus tracing and CORS.
pub fn build_router(state: FrontDoorState) -> Router {
    Router::new()
        .fallback(front_door)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves until `cancel` fires, then drains in-flight requests.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    cancel: CancellationToken,
) -> Result<(), LumenError> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { cancel.cancelled().await })
    .await
    .map_err(|e| LumenError::Network {
        message: format!("front door server error: {e}"),
        source: Some(Box::new(e)),
    })?;

    tracing::info!("front door stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_reports_configured_ports() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            http_port: 0,
            https_port: 8920,
            url_prefixes: vec!["http://+:0/".into()],
        };
        let (_listener, transport) = bind(&config).unwrap();
        assert_eq!(transport.ports(), (0, 8920));
        assert_eq!(transport.url_prefixes(), vec!["http://+:0/"]);
        assert_ne!(transport.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn port_in_use_is_a_network_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            http_port: taken.local_addr().unwrap().port(),
            https_port: 8920,
            url_prefixes: Vec::new(),
        };
        let err = bind(&config).unwrap_err();
        assert!(matches!(err, LumenError::Network { .. }));
    }
}
