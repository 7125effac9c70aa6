// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `agentforge health`: probe a running node

use anyhow::Result;
use colored::Colorize;

use crate::client::ApiClient;

pub async fn run(host: &str, port: u16) -> Result<()> {
    let client = ApiClient::new(host, port)?;
    let health = client.health().await?;

    println!(
        "{}",
        format!("✓ AgentForge at {} is {}", client.base_url(), health.status).green()
    );
    println!("  Uptime: {}s", health.uptime_seconds);
    if health.models.is_empty() {
        println!("  Models: {}", "(none configured)".yellow());
    } else {
        println!("  Models: {}", health.models.join(", "));
    }

    Ok(())
}
