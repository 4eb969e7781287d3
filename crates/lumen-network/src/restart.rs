// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides whether a configuration change can be applied live.

use std::fmt;

use lumen_config::NetworkConfig;
use lumen_core::BoundTransport;

use crate::certificate::CertificateInfo;

/// Why a restart is required. One change may produce several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartReason {
    PortsChanged,
    PrefixesChanged,
    CertificateChanged,
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartReason::PortsChanged => write!(f, "ports changed"),
            RestartReason::PrefixesChanged => write!(f, "url prefixes changed"),
            RestartReason::CertificateChanged => write!(f, "certificate path changed"),
        }
    }
}

/// Prefixes the listener registers for the given ports.
pub fn url_prefixes(http_port: u16, https_port: u16, has_certificate: bool) -> Vec<String> {
    let mut prefixes = vec![format!("http://+:{http_port}/")];
    if has_certificate {
        prefixes.push(format!("https://+:{https_port}/"));
    }
    prefixes
}

/// Element-wise, order-sensitive, ASCII case-insensitive equality.
pub fn prefixes_match(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_ignore_ascii_case(y))
}

/// Compares a new configuration against what is currently bound.
///
/// `transport` is `None` before the front door has bound; ports and prefixes
/// cannot drift then, so only the certificate path is compared.
pub fn evaluate_restart(
    transport: Option<&dyn BoundTransport>,
    bound_certificate: &CertificateInfo,
    network: &NetworkConfig,
    new_certificate: &CertificateInfo,
    new_certificate_usable: bool,
) -> Vec<RestartReason> {
    let mut reasons = Vec::new();

    if let Some(transport) = transport {
        let (http, https) = network.effective_ports();
        if transport.ports() != (http, https) {
            reasons.push(RestartReason::PortsChanged);
        }
        let wanted = url_prefixes(http, https, new_certificate_usable);
        if !prefixes_match(&transport.url_prefixes(), &wanted) {
            reasons.push(RestartReason::PrefixesChanged);
        }
    }

    if !bound_certificate.same_path(new_certificate) {
        reasons.push(RestartReason::CertificateChanged);
    }

    reasons
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::certificate::CertificateSource;

    struct Bound {
        ports: (u16, u16),
        prefixes: Vec<String>,
    }

    impl BoundTransport for Bound {
        fn url_prefixes(&self) -> Vec<String> {
            self.prefixes.clone()
        }

        fn ports(&self) -> (u16, u16) {
            self.ports
        }
    }

    fn cert(path: &str) -> CertificateInfo {
        CertificateInfo {
            path: PathBuf::from(path),
            password: None,
            source: CertificateSource::Custom,
        }
    }

    fn bound_defaults() -> Bound {
        Bound {
            ports: (8096, 8920),
            prefixes: url_prefixes(8096, 8920, false),
        }
    }

    #[test]
    fn prefixes_only_include_https_with_certificate() {
        assert_eq!(url_prefixes(8096, 8920, false), vec!["http://+:8096/"]);
        assert_eq!(
            url_prefixes(8096, 8920, true),
            vec!["http://+:8096/", "https://+:8920/"]
        );
    }

    #[test]
    fn prefix_comparison_is_case_insensitive_and_ordered() {
        let a = vec!["HTTP://+:8096/".to_string(), "https://+:8920/".to_string()];
        let b = vec!["http://+:8096/".to_string(), "HTTPS://+:8920/".to_string()];
        assert!(prefixes_match(&a, &b));
        let reversed: Vec<String> = b.iter().rev().cloned().collect();
        assert!(!prefixes_match(&a, &reversed));
        assert!(!prefixes_match(&a, &b[..1]));
    }

    #[test]
    fn unchanged_configuration_needs_no_restart() {
        let bound = bound_defaults();
        let reasons = evaluate_restart(
            Some(&bound),
            &cert("/ssl/a.pfx"),
            &NetworkConfig::default(),
            &cert("/SSL/A.pfx"),
            false,
        );
        assert!(reasons.is_empty());
    }

    #[test]
    fn port_change_changes_prefixes_too() {
        let bound = bound_defaults();
        let network = NetworkConfig {
            http_port: 9000,
            ..Default::default()
        };
        let reasons = evaluate_restart(
            Some(&bound),
            &cert("/ssl/a.pfx"),
            &network,
            &cert("/ssl/a.pfx"),
            false,
        );
        assert_eq!(
            reasons,
            vec![RestartReason::PortsChanged, RestartReason::PrefixesChanged]
        );
    }

    #[test]
    fn newly_usable_certificate_changes_prefixes() {
        let bound = bound_defaults();
        let reasons = evaluate_restart(
            Some(&bound),
            &cert("/ssl/a.pfx"),
            &NetworkConfig::default(),
            &cert("/ssl/a.pfx"),
            true,
        );
        assert_eq!(reasons, vec![RestartReason::PrefixesChanged]);
    }

    #[test]
    fn certificate_path_checked_without_transport() {
        let reasons = evaluate_restart(
            None,
            &cert("/ssl/a.pfx"),
            &NetworkConfig::default(),
            &cert("/ssl/b.pfx"),
            false,
        );
        assert_eq!(reasons, vec![RestartReason::CertificateChanged]);
    }
}
