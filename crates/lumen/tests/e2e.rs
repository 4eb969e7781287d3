// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the compiled `lumen` binary.
//!
//! Each test writes its own configuration into a temp directory and passes it
//! with `--config`, so tests are independent of the machine's config files.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::Duration;

fn lumen() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lumen"))
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn write_config(dir: &Path, http_port: u16, extra: &str) -> PathBuf {
    let path = dir.join("lumen.toml");
    let content = format!(
        "[server]\nserver_name = \"e2e\"\n\n[network]\nbind_address = \"127.0.0.1\"\nhttp_port = {http_port}\nhttps_port = {}\nwan_ddns = \"media.example.org\"\n\n[paths]\nprogram_data_path = \"{}\"\n{extra}",
        http_port.wrapping_add(1),
        dir.display()
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str], config: &Path) -> Output {
    lumen()
        .args(args)
        .arg("--config")
        .arg(config)
        .output()
        .unwrap()
}

struct Server(Child);

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

async fn wait_for(url: &str, status: u16) -> reqwest::Response {
    let client = reqwest::Client::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    loop {
        if let Ok(resp) = client.get(url).send().await
            && resp.status().as_u16() == status
        {
            return resp;
        }
        assert!(tokio::time::Instant::now() < deadline, "{url} never answered {status}");
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[test]
fn config_validate_accepts_a_good_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), 18096, "");
    let out = run(&["config", "validate"], &config);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("configuration is valid"));
}

#[test]
fn config_validate_rejects_unknown_keys() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), 18096, "\n[plugins]\nTrakt = false\n\n[sever]\nname = \"x\"\n");
    let out = run(&["config", "validate"], &config);
    assert!(!out.status.success());
}

#[test]
fn config_show_prints_effective_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), 18097, "");
    let out = run(&["config", "show"], &config);
    assert!(out.status.success());
    let shown = String::from_utf8_lossy(&out.stdout);
    assert!(shown.contains("http_port = 18097"));
    assert!(shown.contains("server_name = \"e2e\""));
}

#[test]
fn plugins_list_reports_manifests() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), 18098, "");
    let plugin_dir = dir.path().join("plugins/trakt");
    std::fs::create_dir_all(&plugin_dir).unwrap();
    std::fs::write(
        plugin_dir.join("Trakt.plugin.toml"),
        "[module]\nname = \"Trakt\"\nversion = \"2.1\"\n",
    )
    .unwrap();

    let out = run(&["plugins", "list"], &config);
    assert!(out.status.success());
    let listed = String::from_utf8_lossy(&out.stdout);
    assert!(listed.contains("Trakt"));
    assert!(listed.contains("enabled"));
}

#[tokio::test]
async fn serve_answers_ping_and_info() {
    let dir = tempfile::tempdir().unwrap();
    let port = free_port();
    let config = write_config(dir.path(), port, "");
    let _server = Server(
        lumen()
            .arg("serve")
            .arg("--config")
            .arg(&config)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap(),
    );

    let base = format!("http://127.0.0.1:{port}");
    let info: serde_json::Value = wait_for(&format!("{base}/system/info/public"), 200)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(info["ServerName"], "e2e");
    assert_eq!(info["ProductName"], "Lumen Server");
    assert_eq!(info["WanAddress"], "http://media.example.org:8096");
    assert_eq!(info["Id"].as_str().unwrap().len(), 32);

    let ping = reqwest::Client::new()
        .post(format!("{base}/system/ping"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(ping, "Lumen Server");

    assert!(dir.path().join("data/device.txt").is_file());
}

#[tokio::test]
async fn status_reports_a_running_server() {
    let dir = tempfile::tempdir().unwrap();
    let port = free_port();
    let config = write_config(dir.path(), port, "");
    let _server = Server(
        lumen()
            .arg("serve")
            .arg("--config")
            .arg(&config)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap(),
    );
    wait_for(&format!("http://127.0.0.1:{port}/system/info/public"), 200).await;

    let out = tokio::task::spawn_blocking(move || run(&["status", "--json"], &config))
        .await
        .unwrap();
    assert!(out.status.success());
    let status: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(status["running"], true);
    assert_eq!(status["info"]["ServerName"], "e2e");
}
