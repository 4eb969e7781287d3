// SPDX-FileCopyrightText: 2026 Lumen Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `lumen status` command implementation.
//!
//! Asks a running server for its public info. Falls back gracefully when
//! nothing answers.

use std::time::Duration;

use lumen_config::LumenConfig;
use lumen_core::{LumenError, PublicSystemInfo};
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub running: bool,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<PublicSystemInfo>,
}

/// `http://{host}:{port}` of the local front door. Wildcard binds are
/// reached over loopback.
pub fn local_endpoint(config: &LumenConfig) -> String {
    let host = match config.network.bind_address.as_str() {
        "0.0.0.0" | "::" | "" => "127.0.0.1",
        other => other,
    };
    let (http, _) = config.network.effective_ports();
    format!("http://{host}:{http}")
}

/// Runs the `lumen status` command.
pub async fn run_status(config: &LumenConfig, json: bool) -> Result<(), LumenError> {
    let endpoint = local_endpoint(config);
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| LumenError::Internal(format!("failed to create HTTP client: {e}")))?;

    let info = match client
        .get(format!("{endpoint}/system/info/public"))
        .send()
        .await
    {
        Ok(resp) if resp.status().is_success() => Some(resp.json::<PublicSystemInfo>().await.map_err(
            |e| LumenError::Internal(format!("failed to parse status response: {e}")),
        )?),
        _ => None,
    };

    let response = StatusResponse {
        running: info.is_some(),
        endpoint,
        info,
    };
    if json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|e| LumenError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
    } else {
        print_status(&response);
    }
    Ok(())
}

fn print_status(response: &StatusResponse) {
    println!();
    println!("  lumen status");
    println!("  {}", "-".repeat(35));
    match &response.info {
        Some(info) => {
            println!("    State:    [OK] running");
            println!("    Server:   {} ({})", info.server_name, info.version);
            println!("    Id:       {}", info.id);
            if let Some(local) = &info.local_address {
                println!("    Local:    {local}");
            }
            if let Some(wan) = &info.wan_address {
                println!("    Remote:   {wan}");
            }
        }
        None => {
            println!("    State:    [FAIL] not running");
            println!("    Endpoint: {}", response.endpoint);
            println!();
            println!("  Start with: lumen serve");
        }
    }
    println!();
}
