// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifies every inbound request on the shared listener.
//!
//! WebSocket upgrades go to the registered listeners. Everything else waits
//! for the readiness gate and is then forwarded to the API router with a
//! [`RequestContext`] attached.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{ConnectInfo, FromRequestParts, Request, State, ws::WebSocketUpgrade},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use lumen_core::{ReadinessGate, WebSocketListener};
use tower::ServiceExt;

use crate::ws;

/// Body returned while the pre-startup phase is still running.
pub const LOADING_MESSAGE: &str = "Server is loading. Please try again shortly.";

/// Current set of WebSocket listeners. Called once per received frame so
/// hot-installed listeners are picked up without reconnecting.
pub type ListenerSource = Arc<dyn Fn() -> Vec<Arc<dyn WebSocketListener>> + Send + Sync>;

/// What a request/response handler knows about its request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub local_path: String,
    pub url: String,
    pub host: String,
    pub remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    fn from_request(request: &Request, remote_addr: Option<SocketAddr>) -> Self {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| request.uri().authority().map(|a| a.to_string()))
            .unwrap_or_default();
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Self {
            local_path: request.uri().path().to_string(),
            url: format!("http://{host}{path_and_query}"),
            host,
            remote_addr,
        }
    }
}

/// Shared state of the fallback handler.
#[derive(Clone)]
pub struct FrontDoorState {
    pub gate: Arc<ReadinessGate>,
    pub listeners: ListenerSource,
    /// Request/response routes, see [`crate::handlers::api_router`].
    pub api: Router,
}

/// `Connection: upgrade` together with `Upgrade: websocket`.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));
    let upgrade_websocket = headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"));
    connection_upgrade && upgrade_websocket
}

/// Fallback handler for every route.
pub async fn front_door(State(state): State<FrontDoorState>, mut request: Request) -> Response {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    if is_websocket_upgrade(request.headers()) {
        let (mut parts, _body) = request.into_parts();
        return match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
            Ok(upgrade) => ws::accept(upgrade, state.listeners.clone(), remote_addr),
            Err(rejection) => rejection.into_response(),
        };
    }

    if !state.gate.is_open() {
        return (StatusCode::SERVICE_UNAVAILABLE, LOADING_MESSAGE).into_response();
    }

    let context = RequestContext::from_request(&request, remote_addr);
    tracing::debug!(path = %context.local_path, host = %context.host, "request");
    request.extensions_mut().insert(context);

    match state.api.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{self, HeaderValue};
    use axum::routing::get;
    use axum::{Extension, Router};

    use super::*;

    fn state(gate: Arc<ReadinessGate>) -> FrontDoorState {
        let api = Router::new()
            .route("/system/ping", axum::routing::post(|| async { "Lumen Server" }))
            .route(
                "/echo/path",
                get(|Extension(ctx): Extension<RequestContext>| async move {
                    format!("{} {}", ctx.local_path, ctx.url)
                }),
            );
        FrontDoorState {
            gate,
            listeners: Arc::new(|| -> Vec<Arc<dyn WebSocketListener>> { Vec::new() }),
            api,
        }
    }

    fn app(gate: Arc<ReadinessGate>) -> Router {
        Router::new().fallback(front_door).with_state(state(gate))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn upgrade_detection() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, Upgrade"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("WebSocket"));
        assert!(is_websocket_upgrade(&headers));

        headers.insert(header::UPGRADE, HeaderValue::from_static("h2c"));
        assert!(!is_websocket_upgrade(&headers));

        let mut only_upgrade = HeaderMap::new();
        only_upgrade.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        assert!(!is_websocket_upgrade(&only_upgrade));
    }

    #[tokio::test]
    async fn closed_gate_returns_loading() {
        let response = app(Arc::new(ReadinessGate::new()))
            .oneshot(http::Request::get("/echo/path").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, LOADING_MESSAGE);
    }

    #[tokio::test]
    async fn ping_waits_for_the_gate_too() {
        let gate = Arc::new(ReadinessGate::new());
        let ping = || http::Request::post("/system/ping").body(Body::empty()).unwrap();

        let loading = app(gate.clone()).oneshot(ping()).await.unwrap();
        assert_eq!(loading.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(loading).await, LOADING_MESSAGE);

        gate.open();
        let answered = app(gate).oneshot(ping()).await.unwrap();
        assert_eq!(answered.status(), StatusCode::OK);
        assert_eq!(body_text(answered).await, "Lumen Server");
    }

    #[tokio::test]
    async fn open_gate_forwards_with_context() {
        let gate = Arc::new(ReadinessGate::new());
        gate.open();
        let response = app(gate.clone())
            .oneshot(
                http::Request::get("/echo/path?x=1")
                    .header(header::HOST, "media.local:8096")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            "/echo/path http://media.local:8096/echo/path?x=1"
        );

        let missing = app(gate)
            .oneshot(http::Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
