// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTPS certificate selection.
//!
//! A configured certificate wins. Otherwise the path of a self-signed
//! certificate is derived from the external hostname; generating that file
//! is done out of band. Any certificate that cannot be used downgrades the
//! host to plaintext instead of failing startup.

use std::path::{Path, PathBuf};

use lumen_config::{NetworkConfig, PathsConfig};
use md5::{Digest, Md5};
use tracing::{error, warn};

/// Password of derived self-signed certificates.
pub const SELF_SIGNED_PASSWORD: &str = "embycert";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateSource {
    Custom,
    SelfSigned,
}

/// Where a certificate is expected to live and how to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub path: PathBuf,
    pub password: Option<String>,
    pub source: CertificateSource,
}

impl CertificateInfo {
    /// Path comparison used for restart detection; case-insensitive.
    pub fn same_path(&self, other: &CertificateInfo) -> bool {
        self.path
            .to_string_lossy()
            .eq_ignore_ascii_case(&other.path.to_string_lossy())
    }
}

/// A certificate that exists, parses, and carries a private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsableCertificate {
    pub info: CertificateInfo,
    /// Alias of the key entry inside the container.
    pub key_alias: String,
}

/// Host used to name the self-signed certificate.
///
/// The host part of `wan_ddns` when it parses as a URL, the raw value when it
/// does not, and `localhost` when nothing is configured.
pub fn certificate_host(wan_ddns: Option<&str>) -> String {
    match wan_ddns.map(str::trim).filter(|s| !s.is_empty()) {
        None => "localhost".to_string(),
        Some(raw) => url::Url::parse(raw)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| raw.to_string()),
    }
}

/// `cert_{md5 of UTF-16LE(host + "2") as a GUID}.pfx`.
pub fn self_signed_file_name(host: &str) -> String {
    let utf16: Vec<u8> = format!("{host}2")
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();
    let digest: [u8; 16] = Md5::digest(&utf16).into();
    // GUID byte order: the first three groups are little-endian.
    let guid = uuid::Uuid::from_bytes_le(digest);
    format!("cert_{}.pfx", guid.simple())
}

/// Picks the certificate the host should serve.
pub fn resolve_certificate(network: &NetworkConfig, paths: &PathsConfig) -> CertificateInfo {
    if let Some(path) = network
        .certificate_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
    {
        return CertificateInfo {
            path: PathBuf::from(path),
            password: network.certificate_password.clone(),
            source: CertificateSource::Custom,
        };
    }

    let host = certificate_host(network.wan_ddns.as_deref());
    CertificateInfo {
        path: paths.ssl_dir().join(self_signed_file_name(&host)),
        password: Some(SELF_SIGNED_PASSWORD.to_string()),
        source: CertificateSource::SelfSigned,
    }
}

/// Opens the certificate container. `None` if it is missing, unparsable, or
/// has no private key.
pub fn load_certificate(info: &CertificateInfo) -> Option<UsableCertificate> {
    let location = info.path.as_path();
    if !location.exists() {
        if info.source == CertificateSource::Custom {
            warn!(path = %location.display(), "configured certificate does not exist");
        }
        return None;
    }

    // An empty password means no password.
    let password = info
        .password
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("");

    match read_key_alias(location, password) {
        Ok(Some(key_alias)) => Some(UsableCertificate {
            info: info.clone(),
            key_alias,
        }),
        Ok(None) => {
            error!(path = %location.display(), "no private key included in certificate");
            None
        }
        Err(reason) => {
            error!(path = %location.display(), %reason, "error loading certificate");
            None
        }
    }
}

fn read_key_alias(path: &Path, password: &str) -> Result<Option<String>, String> {
    let data = std::fs::read(path).map_err(|e| e.to_string())?;
    let store = p12_keystore::KeyStore::from_pkcs12(&data, password).map_err(|e| e.to_string())?;
    Ok(store
        .private_key_chain()
        .map(|(alias, _chain)| alias.to_string()))
}
