// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network self-location for the Lumen host.
//!
//! Enumerates candidate local addresses, probes them for reachability with a
//! cancellation-aware cache, resolves the HTTPS certificate, formats local and
//! WAN URLs, and decides when a configuration change needs a restart.

pub mod addresses;
pub mod certificate;
pub mod client;
pub mod locator;
pub mod probe;
pub mod restart;
pub mod watcher;

pub use addresses::{NetworkInterfaces, SystemInterfaces};
pub use certificate::{
    CertificateInfo, CertificateSource, UsableCertificate, load_certificate, resolve_certificate,
};
pub use client::{HttpProbeClient, ProbeClient, build_probe_client};
pub use locator::NetworkLocator;
pub use probe::{AddressProbeCache, PING_PATH};
pub use restart::{RestartReason, prefixes_match, url_prefixes};
pub use watcher::spawn_interface_watcher;
