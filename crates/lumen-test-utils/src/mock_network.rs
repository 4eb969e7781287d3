// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network collaborators with scripted behavior.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use lumen_core::LumenError;
use lumen_network::{NetworkInterfaces, ProbeClient};
use parking_lot::Mutex;

/// A probe client answering from a URL to body table.
///
/// URLs without a scripted answer fail like an unreachable host. Every call
/// is recorded.
#[derive(Default)]
pub struct MockProbeClient {
    answers: Mutex<HashMap<String, String>>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
    hang: AtomicBool,
}

impl MockProbeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the body returned for `url`, for both POST and GET.
    pub fn respond(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
        self.answers.lock().insert(url.into(), body.into());
        self
    }

    /// Every later call waits forever, so only cancellation ends it.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }

    async fn answer(&self, url: &str) -> Result<String, LumenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().push(url.to_string());
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.answers
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| LumenError::network(format!("no route to {url}")))
    }
}

#[async_trait]
impl ProbeClient for MockProbeClient {
    async fn post_text(&self, url: &str) -> Result<String, LumenError> {
        self.answer(url).await
    }

    async fn get_text(&self, url: &str) -> Result<String, LumenError> {
        self.answer(url).await
    }
}

/// A fixed interface list.
#[derive(Debug, Clone, Default)]
pub struct FakeInterfaces {
    interfaces: Vec<(String, IpAddr)>,
}

impl FakeInterfaces {
    pub fn new(interfaces: &[(&str, IpAddr)]) -> Self {
        Self {
            interfaces: interfaces
                .iter()
                .map(|(name, addr)| (name.to_string(), *addr))
                .collect(),
        }
    }

    /// Only `lo` on 127.0.0.1.
    pub fn loopback_only() -> Self {
        Self::new(&[("lo", IpAddr::from([127, 0, 0, 1]))])
    }
}

impl NetworkInterfaces for FakeInterfaces {
    fn list(&self) -> Result<Vec<(String, IpAddr)>, LumenError> {
        Ok(self.interfaces.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn scripted_urls_answer_and_others_fail() {
        let client = MockProbeClient::new();
        client.respond("http://10.0.0.2:8096/system/ping", "Lumen Server");

        assert_eq!(
            client.post_text("http://10.0.0.2:8096/system/ping").await.unwrap(),
            "Lumen Server"
        );
        assert!(client.get_text("http://10.0.0.3:8096/system/ping").await.is_err());
        assert_eq!(client.calls(), 2);
        assert_eq!(client.requested().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_client_never_answers() {
        let client = Arc::new(MockProbeClient::new());
        client.hang();
        let call = tokio::time::timeout(Duration::from_secs(60), client.post_text("http://x/"));
        assert!(call.await.is_err());
    }

    #[test]
    fn loopback_only_lists_one_interface() {
        let list = FakeInterfaces::loopback_only().list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].1.is_loopback());
    }
}
