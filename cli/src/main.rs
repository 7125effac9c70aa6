// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # AgentForge
//!
//! The `agentforge` binary runs an AgentForge node and talks to one.
//!
//! ## Commands
//!
//! - `agentforge serve` - Run the HTTP API in the foreground
//! - `agentforge agent list|create|show|delete|execute|status` - Agent operations against a running node
//! - `agentforge config show|validate|generate` - Configuration management
//! - `agentforge health` - Check a running node

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use agentforge::client::{DEFAULT_HOST, DEFAULT_PORT};
use agentforge::commands::{self, AgentCommand, ConfigCommand, ServeArgs};

/// AgentForge - create and run LLM agents over HTTP
#[derive(Parser)]
#[command(name = "agentforge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AGENTFORGE_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: 8000, or spec.server.port when serving)
    #[arg(long, global = true, env = "AGENTFORGE_PORT")]
    port: Option<u16>,

    /// HTTP API host (default: 127.0.0.1, or spec.server.bind_address when serving)
    #[arg(long, global = true, env = "AGENTFORGE_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGENTFORGE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format (text, json)
    #[arg(long, global = true, env = "AGENTFORGE_LOG_FORMAT", default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the AgentForge HTTP API
    #[command(name = "serve")]
    Serve(ServeArgs),

    /// Agent management
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Check that a node is up and list its models
    #[command(name = "health")]
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    init_logging(&cli.log_level, &cli.log_format)?;

    match cli.command {
        Some(Commands::Serve(args)) => {
            commands::serve::run(args, cli.config, cli.host, cli.port).await
        }
        Some(Commands::Agent { command }) => {
            let host = cli.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
            commands::agent::handle_command(command, &host, cli.port.unwrap_or(DEFAULT_PORT))
                .await
        }
        Some(Commands::Health) => {
            let host = cli.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
            commands::health::run(&host, cli.port.unwrap_or(DEFAULT_PORT)).await
        }
        Some(Commands::Config { command }) => {
            commands::config::handle_command(command, cli.config).await
        }
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        "json" => builder.json().init(),
        "text" => builder.compact().init(),
        other => anyhow::bail!("Unknown log format '{}'. Expected 'text' or 'json'", other),
    }

    Ok(())
}
