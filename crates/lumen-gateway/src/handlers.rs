// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response handlers behind the front door.
//!
//! Handles POST /system/ping, GET /system/info, GET /system/info/public.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use lumen_core::{LumenError, PublicSystemInfo, SystemInfo};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::front_door::RequestContext;

/// Produces the status snapshot served by the info routes.
#[async_trait]
pub trait SystemInfoSource: Send + Sync {
    async fn system_info(&self, cancel: &CancellationToken) -> Result<SystemInfo, LumenError>;
}

/// State shared by the request/response routes.
#[derive(Clone)]
pub struct ApiState {
    /// Body of the ping response.
    pub product_name: String,
    pub info: Arc<dyn SystemInfoSource>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

/// Routes reached once the front door has classified a request.
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/system/ping", post(post_ping))
        .route("/system/info", get(get_system_info))
        .route("/system/info/public", get(get_public_system_info))
        .with_state(state)
}

/// POST /system/ping
///
/// Answers with the product name. Reachability probes compare against it.
pub async fn post_ping(
    State(state): State<ApiState>,
    context: Option<Extension<RequestContext>>,
) -> String {
    if let Some(Extension(context)) = context {
        tracing::trace!(host = %context.host, "ping");
    }
    state.product_name
}

/// GET /system/info
pub async fn get_system_info(
    State(state): State<ApiState>,
    context: Option<Extension<RequestContext>>,
) -> Response {
    match load_info(&state, context).await {
        Ok(info) => Json(info).into_response(),
        Err(response) => response,
    }
}

/// GET /system/info/public
pub async fn get_public_system_info(
    State(state): State<ApiState>,
    context: Option<Extension<RequestContext>>,
) -> Response {
    match load_info(&state, context).await {
        Ok(info) => Json(PublicSystemInfo::from(&info)).into_response(),
        Err(response) => response,
    }
}

async fn load_info(
    state: &ApiState,
    context: Option<Extension<RequestContext>>,
) -> Result<SystemInfo, Response> {
    // Probes also stop when the client disconnects and this future is dropped.
    let cancel = CancellationToken::new();
    state.info.system_info(&cancel).await.map_err(|e| {
        let path = context.map(|Extension(c)| c.local_path).unwrap_or_default();
        tracing::error!(error = %e, path = %path, "failed to build system info");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response()
    })
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;

    struct StaticInfo(SystemInfo);

    #[async_trait]
    impl SystemInfoSource for StaticInfo {
        async fn system_info(&self, _cancel: &CancellationToken) -> Result<SystemInfo, LumenError> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl SystemInfoSource for Failing {
        async fn system_info(&self, _cancel: &CancellationToken) -> Result<SystemInfo, LumenError> {
            Err(LumenError::Internal("no id".into()))
        }
    }

    fn info() -> SystemInfo {
        SystemInfo {
            version: "0.1.0".into(),
            product_name: "Lumen Server".into(),
            server_name: "den".into(),
            id: "abc".into(),
            local_address: Some("http://10.0.0.2:8096".into()),
            http_server_port_number: 8096,
            https_port_number: 8920,
            ..Default::default()
        }
    }

    fn router(source: Arc<dyn SystemInfoSource>) -> Router {
        api_router(ApiState {
            product_name: "Lumen Server".into(),
            info: source,
        })
    }

    #[tokio::test]
    async fn ping_returns_product_name() {
        let response = router(Arc::new(StaticInfo(info())))
            .oneshot(
                Request::post("/system/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Lumen Server");
    }

    #[tokio::test]
    async fn public_info_omits_private_fields() {
        let response = router(Arc::new(StaticInfo(info())))
            .oneshot(
                Request::get("/system/info/public")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ServerName"], "den");
        assert_eq!(json["LocalAddress"], "http://10.0.0.2:8096");
        assert!(json.get("ProgramDataPath").is_none());
    }

    #[tokio::test]
    async fn info_failure_is_500() {
        let response = router(Arc::new(Failing))
            .oneshot(Request::get("/system/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
