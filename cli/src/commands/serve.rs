// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! `agentforge serve`: run the HTTP API in the foreground

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use agentforge_core::domain::node_config::NodeConfig;
use agentforge_core::presentation::api::app;
use agentforge_core::AgentService;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Skip the provider health probe at startup
    #[arg(long)]
    pub skip_health_check: bool,
}

pub async fn run(
    args: ServeArgs,
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let config = NodeConfig::load_or_default(config_path).context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    info!(node = %config.metadata.name, "Starting AgentForge node");

    if let Some(metrics) = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.metrics.as_ref())
        .filter(|m| m.enabled)
    {
        init_metrics(metrics.port)?;
    }

    let service = AgentService::from_config(&config).context("Failed to initialize agent service")?;
    let models = service.available_models();
    if models.is_empty() {
        warn!("No LLM provider is mapped to any model. Agents can be created but will fail to execute.");
    } else {
        info!("Models available: {:?}", models);
    }

    if !args.skip_health_check {
        for (provider, result) in service.executor().providers().health_check_all().await {
            match result {
                Ok(()) => info!(provider = %provider, "LLM provider healthy"),
                Err(e) => warn!(provider = %provider, "LLM provider health check failed: {}", e),
            }
        }
    }

    let bind_host = host.unwrap_or_else(|| config.spec.server.bind_address.clone());
    let bind_port = port.unwrap_or(config.spec.server.port);
    let listener = bind_listener(&bind_host, bind_port).await?;

    info!(
        "AgentForge API listening on http://{}",
        listener
            .local_addr()
            .context("Failed to read listener address")?
    );

    axum::serve(listener, app(Arc::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("AgentForge node stopped");
    Ok(())
}

/// Bind the API listener; `host` may be a hostname or an IP literal
async fn bind_listener(host: &str, port: u16) -> Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {}:{}", host, port))
}

fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus exporter")?;
    info!("Prometheus metrics exposed on port {}", port);
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_resolves_hostname() {
        let listener = bind_listener("localhost", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bind_accepts_ip_literal() {
        let listener = bind_listener("127.0.0.1", 0).await.unwrap();
        assert_eq!(listener.local_addr().unwrap().ip().to_string(), "127.0.0.1");
    }
}
