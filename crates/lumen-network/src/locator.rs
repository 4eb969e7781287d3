// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! How this host can be reached, locally and from the internet.

use std::net::IpAddr;
use std::sync::Arc;

use lumen_config::{ConfigurationManager, LumenConfig};
use lumen_core::{BoundTransport, Deferred, EdgeTriggeredFlag, LumenError, PRODUCT_NAME};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::addresses::{
    NetworkInterfaces, configured_addresses, interface_addresses, url_host,
};
use crate::certificate::{CertificateInfo, UsableCertificate, load_certificate, resolve_certificate};
use crate::client::ProbeClient;
use crate::probe::{AddressProbeCache, probe_url};
use crate::restart::{RestartReason, evaluate_restart, url_prefixes};

/// Certificate chosen at startup. Replaced only by a restart.
#[derive(Debug, Clone)]
struct BoundCertificate {
    info: CertificateInfo,
    usable: Option<UsableCertificate>,
}

/// Resolves local and WAN URLs, probes reachability, and flags restarts.
pub struct NetworkLocator {
    config: Arc<ConfigurationManager>,
    client: Arc<dyn ProbeClient>,
    interfaces: Arc<dyn NetworkInterfaces>,
    cache: AddressProbeCache,
    certificate: RwLock<BoundCertificate>,
    restart: Arc<EdgeTriggeredFlag>,
    transport: Option<Deferred<dyn BoundTransport>>,
    product_name: String,
}

impl NetworkLocator {
    /// Resolves and loads the certificate from the current configuration.
    pub fn new(
        config: Arc<ConfigurationManager>,
        client: Arc<dyn ProbeClient>,
        interfaces: Arc<dyn NetworkInterfaces>,
        restart: Arc<EdgeTriggeredFlag>,
    ) -> Self {
        let current = config.current();
        let info = resolve_certificate(&current.network, &current.paths);
        let usable = load_certificate(&info);
        Self {
            config,
            client,
            interfaces,
            cache: AddressProbeCache::new(),
            certificate: RwLock::new(BoundCertificate { info, usable }),
            restart,
            transport: None,
            product_name: PRODUCT_NAME.to_string(),
        }
    }

    /// Reads bound ports and prefixes through `transport` when comparing
    /// configuration changes.
    pub fn with_transport(mut self, transport: Deferred<dyn BoundTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Name a probed address must answer with to count as this host.
    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = name.into();
        self
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn certificate(&self) -> CertificateInfo {
        self.certificate.read().info.clone()
    }

    pub fn usable_certificate(&self) -> Option<UsableCertificate> {
        self.certificate.read().usable.clone()
    }

    pub fn supports_https(&self) -> bool {
        self.certificate.read().usable.is_some() || self.config.current().network.is_behind_proxy
    }

    pub fn enable_https(&self) -> bool {
        self.supports_https() && self.config.current().network.enable_https
    }

    /// Prefixes the transport should register right now.
    pub fn url_prefixes(&self) -> Vec<String> {
        let (http, https) = self.config.current().network.effective_ports();
        url_prefixes(http, https, self.certificate.read().usable.is_some())
    }

    /// `{scheme}://{host}:{port}` for a local address.
    pub fn local_base_url(&self, addr: &IpAddr) -> String {
        let (http, https) = self.config.current().network.effective_ports();
        if self.enable_https() {
            format!("https://{}:{https}", url_host(addr))
        } else {
            format!("http://{}:{http}", url_host(addr))
        }
    }

    /// `{scheme}://{host}:{public port}` for an externally visible host.
    pub fn wan_base_url(&self, host: &str) -> String {
        let network = &self.config.current().network;
        if self.enable_https() {
            format!("https://{host}:{}", network.public_https_port)
        } else {
            format!("http://{host}:{}", network.public_port)
        }
    }

    /// Candidate addresses, loopback included.
    pub fn all_local_addresses(&self) -> Vec<IpAddr> {
        let network = &self.config.current().network;
        let configured = configured_addresses(&network.local_network_addresses);
        if !configured.is_empty() {
            return configured;
        }
        interface_addresses(self.interfaces.as_ref(), network.ignore_virtual_interfaces)
    }

    /// Candidate addresses without loopback.
    pub fn local_addresses(&self) -> Vec<IpAddr> {
        self.all_local_addresses()
            .into_iter()
            .filter(|addr| !addr.is_loopback())
            .collect()
    }

    /// Whether `addr` answers the ping route with this host's product name.
    ///
    /// Results are cached until [`NetworkLocator::on_network_changed`].
    /// Failures are cached as unreachable. A loading placeholder reply counts
    /// as unreachable but is not cached. Cancellation is returned as
    /// [`LumenError::Cancelled`] and leaves the cache untouched.
    pub async fn is_reachable(
        &self,
        addr: &IpAddr,
        cancel: &CancellationToken,
    ) -> Result<bool, LumenError> {
        if addr.is_loopback() {
            return Ok(true);
        }

        let url = probe_url(&self.local_base_url(addr));
        if let Some(cached) = self.cache.get(&url) {
            return Ok(cached);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%url, "ping test cancelled");
                return Err(LumenError::Cancelled);
            }
            outcome = self.client.post_text(&url) => outcome,
        };

        let reachable = match outcome {
            Ok(body) => body.eq_ignore_ascii_case(&self.product_name),
            Err(LumenError::Cancelled) => return Err(LumenError::Cancelled),
            Err(LumenError::Unavailable(_)) => {
                debug!(%url, "host is still loading, ping result not cached");
                return Ok(false);
            }
            Err(e) => {
                debug!(%url, error = %e, "ping test failed");
                false
            }
        };
        debug!(%url, reachable, "ping test result");
        self.cache.insert(&url, reachable);
        Ok(reachable)
    }

    /// Every candidate address that answers, loopback included.
    pub async fn reachable_local_addresses(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<IpAddr>, LumenError> {
        let mut reachable = Vec::new();
        for addr in self.all_local_addresses() {
            if self.is_reachable(&addr, cancel).await? {
                reachable.push(addr);
            }
        }
        Ok(reachable)
    }

    /// URL of the first reachable non-loopback address.
    pub async fn local_api_url(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, LumenError> {
        for addr in self.local_addresses() {
            if self.is_reachable(&addr, cancel).await? {
                return Ok(Some(self.local_base_url(&addr)));
            }
        }
        Ok(None)
    }

    /// Externally visible URL: the configured DDNS host, else a lookup.
    pub async fn wan_api_url(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, LumenError> {
        let network = self.config.current().network.clone();
        if let Some(ddns) = network
            .wan_ddns
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            return Ok(Some(self.wan_base_url(ddns)));
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LumenError::Cancelled),
            outcome = self.client.get_text(&network.wan_lookup_url) => outcome,
        };
        match outcome {
            Ok(body) if !body.trim().is_empty() => Ok(Some(self.wan_base_url(body.trim()))),
            Ok(_) => {
                error!(url = %network.wan_lookup_url, "WAN address lookup returned an empty body");
                Ok(None)
            }
            Err(LumenError::Cancelled) => Err(LumenError::Cancelled),
            Err(e) => {
                error!(url = %network.wan_lookup_url, error = %e, "error getting WAN address");
                Ok(None)
            }
        }
    }

    /// Checks whether `config` can be applied without a restart.
    ///
    /// Raises the restart flag when it cannot. The bound certificate is kept;
    /// the new one takes effect after the restart.
    pub fn on_configuration_changed(&self, config: &LumenConfig) -> Vec<RestartReason> {
        let new_info = resolve_certificate(&config.network, &config.paths);
        let new_usable = load_certificate(&new_info).is_some();

        let transport = self.transport.as_ref().and_then(|t| t.get().ok());
        let bound = self.certificate.read().info.clone();
        let reasons = evaluate_restart(
            transport.as_deref(),
            &bound,
            &config.network,
            &new_info,
            new_usable,
        );

        if !reasons.is_empty() {
            let listed: Vec<String> = reasons.iter().map(ToString::to_string).collect();
            info!(reasons = %listed.join(", "), "configuration change requires the host to be restarted");
            self.restart.raise();
        }
        reasons
    }

    /// Forgets every cached probe result.
    pub fn on_network_changed(&self) {
        debug!(entries = self.cache.len(), "network changed, clearing probe cache");
        self.cache.clear();
    }

    pub fn probe_cache(&self) -> &AddressProbeCache {
        &self.cache
    }

    pub fn restart_flag(&self) -> &Arc<EdgeTriggeredFlag> {
        &self.restart
    }

    pub(crate) fn interfaces(&self) -> &dyn NetworkInterfaces {
        self.interfaces.as_ref()
    }

    pub(crate) fn ignore_virtual_interfaces(&self) -> bool {
        self.config.current().network.ignore_virtual_interfaces
    }
}

impl std::fmt::Debug for NetworkLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkLocator")
            .field("certificate", &self.certificate.read().info.path)
            .field("cached_probes", &self.cache.len())
            .field("product_name", &self.product_name)
            .finish()
    }
}
