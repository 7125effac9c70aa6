// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Agent management commands, delegated to a running server over HTTP

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use agentforge_core::application::validation::CreateAgentRequest;
use agentforge_core::domain::agent::{AgentId, AgentRecord, AgentStatus};

use crate::client::ApiClient;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// List registered agents
    List,

    /// Register a new agent
    Create {
        /// Agent definition file (YAML or JSON); flags override its fields
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        system_prompt: Option<String>,

        /// One of gpt-4.1-nano, gpt-4, gpt-3.5-turbo
        #[arg(long)]
        model: Option<String>,

        /// Tool id to enable (repeatable)
        #[arg(long = "tool", value_name = "TOOL_ID")]
        tools: Vec<String>,
    },

    /// Show an agent's stored configuration
    Show {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,

        /// Print the generated agent code instead
        #[arg(long)]
        code: bool,
    },

    /// Remove an agent
    Delete {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,
    },

    /// Run a prompt against an agent
    Execute {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,

        #[arg(value_name = "PROMPT")]
        prompt: String,
    },

    /// Set an agent's status (active, inactive)
    Status {
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,

        #[arg(value_name = "STATUS")]
        status: AgentStatus,
    },
}

pub async fn handle_command(command: AgentCommand, host: &str, port: u16) -> Result<()> {
    let client = ApiClient::new(host, port)?;

    match command {
        AgentCommand::List => list_agents(&client).await,
        AgentCommand::Create {
            file,
            name,
            description,
            system_prompt,
            model,
            tools,
        } => {
            let mut request = match file {
                Some(path) => load_request(&path)?,
                None => CreateAgentRequest::default(),
            };
            request.name = name.or(request.name);
            request.description = description.or(request.description);
            request.system_prompt = system_prompt.or(request.system_prompt);
            request.model = model.or(request.model);
            if !tools.is_empty() {
                request.tools = Some(tools);
            }
            create_agent(&client, request).await
        }
        AgentCommand::Show { agent_id, code } => show_agent(&client, agent_id.into(), code).await,
        AgentCommand::Delete { agent_id } => delete_agent(&client, agent_id.into()).await,
        AgentCommand::Execute { agent_id, prompt } => {
            execute_agent(&client, agent_id.into(), &prompt).await
        }
        AgentCommand::Status { agent_id, status } => {
            set_status(&client, agent_id.into(), status).await
        }
    }
}

/// YAML is a superset of JSON, so one parser covers both
fn load_request(path: &Path) -> Result<CreateAgentRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read agent definition: {:?}", path))?;
    serde_yaml::from_str(&content).context("Failed to parse agent definition")
}

async fn list_agents(client: &ApiClient) -> Result<()> {
    let agents = client.list_agents().await?;

    if agents.is_empty() {
        println!("{}", "No agents found".yellow());
        return Ok(());
    }

    println!("{} agents found:", agents.len());
    println!(
        "{:<30} {:<24} {:<14} {:<10} {}",
        "ID", "NAME", "MODEL", "STATUS", "CREATED"
    );

    for agent in agents {
        println!(
            "{:<30} {:<24} {:<14} {:<10} {}",
            agent.id,
            agent.name.bold(),
            agent.model,
            status_label(agent.status),
            agent.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

fn status_label(status: AgentStatus) -> colored::ColoredString {
    match status {
        AgentStatus::Active => "active".green(),
        AgentStatus::Inactive => "inactive".dimmed(),
    }
}

async fn create_agent(client: &ApiClient, request: CreateAgentRequest) -> Result<()> {
    if let Some(name) = &request.name {
        println!("Creating agent: {}", name.bold());
    }

    let created = client.create_agent(&request).await?;

    println!("{}", format!("✓ {}", created.message).green());
    println!("  ID: {}", created.agent_id);
    if !created.dropped_tools.is_empty() {
        println!(
            "{}",
            format!(
                "⚠ Unknown tools were ignored: {}",
                created.dropped_tools.join(", ")
            )
            .yellow()
        );
    }

    Ok(())
}

async fn show_agent(client: &ApiClient, agent_id: AgentId, code: bool) -> Result<()> {
    let agent = client.get_agent(&agent_id).await?;

    if code {
        println!("{}", agent.code);
    } else {
        print!("{}", render_agent(&agent)?);
    }

    Ok(())
}

/// YAML view of an agent without the generated code
fn render_agent(agent: &AgentRecord) -> Result<String> {
    let mut value = serde_yaml::to_value(agent)?;
    if let serde_yaml::Value::Mapping(map) = &mut value {
        map.remove("code");
    }
    Ok(serde_yaml::to_string(&value)?)
}

async fn delete_agent(client: &ApiClient, agent_id: AgentId) -> Result<()> {
    client.delete_agent(&agent_id).await?;
    println!("{}", format!("✓ Agent {} deleted", agent_id).green());
    Ok(())
}

async fn execute_agent(client: &ApiClient, agent_id: AgentId, prompt: &str) -> Result<()> {
    println!("{}", format!("Running agent {}...", agent_id).dimmed());
    let result = client.execute_agent(&agent_id, prompt).await?;
    println!("{}", result);
    Ok(())
}

async fn set_status(client: &ApiClient, agent_id: AgentId, status: AgentStatus) -> Result<()> {
    let agent = client.set_status(&agent_id, status).await?;
    println!(
        "{}",
        format!("✓ Agent {} is now {}", agent.id, agent.status).green()
    );
    Ok(())
}
