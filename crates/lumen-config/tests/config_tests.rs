// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Lumen configuration system.

use lumen_config::diagnostic::ConfigError;
use lumen_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
server_name = "living-room"
log_level = "debug"

[network]
http_port = 9096
https_port = 9920
public_port = 80
public_https_port = 443
enable_https = true
is_behind_proxy = true
wan_ddns = "media.example.org"
local_network_addresses = ["192.168.1.20", "http://10.0.0.5/"]
ignore_virtual_interfaces = false

[paths]
program_data_path = "/srv/lumen"
plugins_path = "/srv/lumen/extensions"

[plugins]
"Trakt" = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.server_name.as_deref(), Some("living-room"));
    assert_eq!(config.network.http_port, 9096);
    assert_eq!(config.network.public_https_port, 443);
    assert!(config.network.is_behind_proxy);
    assert_eq!(config.network.wan_ddns.as_deref(), Some("media.example.org"));
    assert_eq!(config.network.local_network_addresses.len(), 2);
    assert!(!config.network.ignore_virtual_interfaces);
    assert_eq!(
        config.paths.plugins_dir(),
        std::path::PathBuf::from("/srv/lumen/extensions")
    );
    assert!(!config.plugin_enabled("Trakt"));
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.network.http_port, 8096);
    assert_eq!(config.network.https_port, 8920);
    assert_eq!(config.network.wan_lookup_url, "http://ipv4.icanhazip.com");
    assert!(config.plugins.is_empty());
}

#[test]
fn unknown_network_key_suggests_correction() {
    let toml = r#"
[network]
htp_port = 9000
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert!(key.ends_with("htp_port"));
            assert_eq!(suggestion.as_deref(), Some("http_port"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[network]
http_port = "eighty"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_errors_surface_after_parse() {
    let toml = r#"
[network]
bind_address = "everywhere"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn environment_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[network]
http_port = 9096
"#,
        )?;
        jail.set_env("LUMEN_NETWORK_HTTP_PORT", "7096");
        jail.set_env("LUMEN_SERVER_SERVER_NAME", "attic");

        let config = load_and_validate_path(std::path::Path::new("custom.toml"))
            .map_err(|errors| format!("{errors:?}"))?;
        assert_eq!(config.network.http_port, 7096);
        assert_eq!(config.server.server_name.as_deref(), Some("attic"));
        Ok(())
    });
}

#[test]
fn effective_config_renders_to_toml() {
    let config = load_and_validate_str("[network]\nhttp_port = 9096\n").unwrap();
    let rendered = config.to_toml().unwrap();
    assert!(rendered.contains("http_port = 9096"));
    let reparsed = load_config_from_str(&rendered).unwrap();
    assert_eq!(reparsed, config);
}
