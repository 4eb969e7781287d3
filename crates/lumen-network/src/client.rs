// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound HTTP used for reachability probes and WAN address lookup.

use std::time::Duration;

use async_trait::async_trait;
use lumen_core::LumenError;
use tracing::error;

/// Minimal HTTP surface the locator needs. Mocked in tests.
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// POSTs an empty body and returns the response text.
    async fn post_text(&self, url: &str) -> Result<String, LumenError>;

    /// GETs `url` and returns the response text.
    async fn get_text(&self, url: &str) -> Result<String, LumenError>;
}

/// Builds the client used for probing this host's own addresses.
///
/// Self-signed certificates are accepted because the host probes itself and
/// usually serves the certificate it generated.
pub fn build_probe_client(timeout: Duration) -> Result<reqwest::Client, LumenError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| {
            error!("failed to build probe HTTP client: {e}");
            LumenError::Network {
                message: "failed to build probe HTTP client".into(),
                source: Some(Box::new(e)),
            }
        })
}

/// [`ProbeClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpProbeClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbeClient {
    /// `timeout` must match the one `client` was built with; it is only used
    /// for error reporting.
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, LumenError> {
        Ok(Self::new(build_probe_client(timeout)?, timeout))
    }

    async fn read_text(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String, LumenError> {
        let response = request.send().await.map_err(|e| self.to_error(url, e))?;
        if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            return Err(LumenError::Unavailable(url.to_string()));
        }
        let response = response
            .error_for_status()
            .map_err(|e| self.to_error(url, e))?;
        response.text().await.map_err(|e| self.to_error(url, e))
    }

    fn to_error(&self, url: &str, e: reqwest::Error) -> LumenError {
        if e.is_timeout() {
            return LumenError::Timeout {
                duration: self.timeout,
            };
        }
        LumenError::Network {
            message: format!("request to {url} failed"),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl ProbeClient for HttpProbeClient {
    async fn post_text(&self, url: &str) -> Result<String, LumenError> {
        self.read_text(self.client.post(url), url).await
    }

    async fn get_text(&self, url: &str) -> Result<String, LumenError> {
        self.read_text(self.client.get(url), url).await
    }
}
