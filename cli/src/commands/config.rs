// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use agentforge_core::domain::node_config::{NodeConfig, CONFIG_PATH_ENV};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./agentforge-config.yaml)
        #[arg(short, long, default_value = "./agentforge-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate {
            output,
            examples,
            force,
        } => generate(output, examples, force).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = NodeConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  --config flag: {}", path.display()),
            None => println!("  --config flag: {}", "(not set)".dimmed()),
        }
        if std::env::var(CONFIG_PATH_ENV).is_err() {
            println!("  {}: {}", CONFIG_PATH_ENV, "(not set)".dimmed());
        }
        for (i, path) in NodeConfig::discovery_paths().iter().enumerate() {
            let marker = if path.exists() { "✓".green() } else { "-".dimmed() };
            println!("  {}. {} {}", i + 1, marker, path.display());
        }
        println!();
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Node:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(version) = &config.metadata.version {
        println!("  Version: {}", version);
    }
    println!(
        "  Listen: {}:{}",
        config.spec.server.bind_address, config.spec.server.port
    );
    println!();

    println!("{}", "LLM Providers:".bold());
    if config.spec.llm_providers.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for provider in &config.spec.llm_providers {
        let state = if provider.enabled {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        println!(
            "  {} ({}, {})",
            provider.name.bold(),
            provider.provider_type,
            state
        );
        println!("    Endpoint: {}", provider.endpoint);
        for model in &provider.models {
            println!("      - {} → {}", model.alias, model.model);
        }
    }
    println!();

    let selection = &config.spec.llm_selection;
    println!("{}", "LLM Selection:".bold());
    println!(
        "  Fallback provider: {}",
        selection.fallback_provider.as_deref().unwrap_or("(none)")
    );
    println!("  Max attempts: {}", selection.max_attempts);
    println!("  Retry delay: {}ms", selection.retry_delay_ms);
    println!();

    let executor = &config.spec.executor;
    println!("{}", "Executor:".bold());
    println!("  Max tool steps: {}", executor.max_tool_steps);
    println!("  Memory (last messages): {}", executor.memory_last_messages);
    println!("  Rebuild on cache miss: {}", executor.rebuild_on_miss);
    println!();

    if let Some(metrics) = config
        .spec
        .observability
        .as_ref()
        .and_then(|o| o.metrics.as_ref())
    {
        println!("{}", "Metrics:".bold());
        println!("  Enabled: {}", metrics.enabled);
        println!("  Port: {}", metrics.port);
        println!();
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = NodeConfig::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            output.display()
        );
    }

    std::fs::write(&output, sample(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn sample(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}
