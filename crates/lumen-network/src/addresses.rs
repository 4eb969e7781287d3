// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Candidate local addresses: configured overrides or live interfaces.

use std::net::IpAddr;

use lumen_core::LumenError;
use tracing::warn;

/// Interface name prefixes treated as virtual.
const VIRTUAL_INTERFACE_PREFIXES: &[&str] = &[
    "docker", "veth", "br-", "virbr", "vmnet", "vboxnet", "tun", "tap", "zt", "utun",
];

/// Source of `(interface name, address)` pairs.
pub trait NetworkInterfaces: Send + Sync {
    fn list(&self) -> Result<Vec<(String, IpAddr)>, LumenError>;
}

/// Enumerates the machine's interfaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl NetworkInterfaces for SystemInterfaces {
    fn list(&self) -> Result<Vec<(String, IpAddr)>, LumenError> {
        local_ip_address::list_afinet_netifas().map_err(|e| LumenError::Network {
            message: "failed to enumerate network interfaces".into(),
            source: Some(Box::new(e)),
        })
    }
}

pub fn is_virtual_interface(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    VIRTUAL_INTERFACE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Normalizes one configured address.
///
/// Accepts bare addresses and URL-ish forms: `http://10.0.0.5/` and
/// `10.0.0.5/` both give `10.0.0.5`. Returns `None` for anything that is not
/// an IP address.
pub fn normalize_configured_address(raw: &str) -> Option<IpAddr> {
    let trimmed = raw.trim().trim_matches('/');
    let candidate = match trimmed.rfind('/') {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    };
    let candidate = candidate.trim_matches('/');
    let candidate = candidate
        .strip_prefix('[')
        .and_then(|c| c.strip_suffix(']'))
        .unwrap_or(candidate);
    candidate.parse().ok()
}

/// Parses the configured overrides, silently dropping invalid entries.
pub fn configured_addresses(raw: &[String]) -> Vec<IpAddr> {
    dedup(raw.iter().filter_map(|a| normalize_configured_address(a)))
}

/// Live interface addresses. Loopback is kept; IPv6 link-local is skipped
/// because it cannot be probed without a scope id.
pub fn interface_addresses(
    interfaces: &dyn NetworkInterfaces,
    ignore_virtual: bool,
) -> Vec<IpAddr> {
    let list = match interfaces.list() {
        Ok(list) => list,
        Err(e) => {
            warn!(error = %e, "network interface enumeration failed");
            return Vec::new();
        }
    };
    dedup(
        list.into_iter()
            .filter(|(name, _)| !(ignore_virtual && is_virtual_interface(name)))
            .map(|(_, addr)| addr)
            .filter(|addr| !is_ipv6_link_local(addr)),
    )
}

fn is_ipv6_link_local(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
        IpAddr::V4(_) => false,
    }
}

fn dedup(addrs: impl Iterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut out: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !out.contains(&addr) {
            out.push(addr);
        }
    }
    out
}

/// Formats an address for use as a URL host; IPv6 is bracketed.
pub fn url_host(addr: &IpAddr) -> String {
    match addr {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{v6}]"),
    }
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use proptest::prelude::*;

    use super::*;

    struct Fixed(Vec<(String, IpAddr)>);

    impl NetworkInterfaces for Fixed {
        fn list(&self) -> Result<Vec<(String, IpAddr)>, LumenError> {
            Ok(self.0.clone())
        }
    }

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn normalizes_url_forms() {
        assert_eq!(
            normalize_configured_address("192.168.1.4"),
            Some(v4(192, 168, 1, 4))
        );
        assert_eq!(
            normalize_configured_address("http://10.0.0.5/"),
            Some(v4(10, 0, 0, 5))
        );
        assert_eq!(
            normalize_configured_address("/10.0.0.6/"),
            Some(v4(10, 0, 0, 6))
        );
        assert_eq!(
            normalize_configured_address("[fd00::1]"),
            Some(IpAddr::V6("fd00::1".parse().unwrap()))
        );
        assert_eq!(normalize_configured_address("media.local"), None);
        assert_eq!(normalize_configured_address(""), None);
    }

    #[test]
    fn invalid_overrides_are_dropped() {
        let raw = vec![
            "10.0.0.2".to_string(),
            "garbage".to_string(),
            "http://10.0.0.2/".to_string(),
            "10.0.0.3".to_string(),
        ];
        assert_eq!(
            configured_addresses(&raw),
            vec![v4(10, 0, 0, 2), v4(10, 0, 0, 3)]
        );
    }

    #[test]
    fn virtual_interfaces_are_filtered_when_requested() {
        let ifaces = Fixed(vec![
            ("eth0".into(), v4(192, 168, 1, 10)),
            ("docker0".into(), v4(172, 17, 0, 1)),
            ("lo".into(), v4(127, 0, 0, 1)),
            ("eth0".into(), IpAddr::V6("fe80::1".parse().unwrap())),
        ]);
        assert_eq!(
            interface_addresses(&ifaces, true),
            vec![v4(192, 168, 1, 10), v4(127, 0, 0, 1)]
        );
        assert_eq!(interface_addresses(&ifaces, false).len(), 3);
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        assert_eq!(url_host(&v4(10, 0, 0, 1)), "10.0.0.1");
        assert_eq!(url_host(&IpAddr::V6(Ipv6Addr::LOCALHOST)), "[::1]");
    }

    proptest! {
        #[test]
        fn any_ipv4_survives_url_wrapping(a in any::<u8>(), b in any::<u8>(), c in any::<u8>(), d in any::<u8>()) {
            let addr = v4(a, b, c, d);
            prop_assert_eq!(normalize_configured_address(&format!("http://{addr}/")), Some(addr));
            prop_assert_eq!(normalize_configured_address(&addr.to_string()), Some(addr));
        }
    }
}
