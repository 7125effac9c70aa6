// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Agent
//!
//! Identity and configuration of a created agent.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** `AgentRecord` aggregate, its id scheme and its status

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque agent identifier: `agent_<unix-millis>_<9 base-36 chars>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Generate a fresh id from the current time and a random suffix.
    ///
    /// Uniqueness within a process is enforced by the registry, which
    /// regenerates on collision.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let mut rng = rand::rng();
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("agent_{}_{}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle status of a stored agent. Any status may follow any status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentStatus::Active => f.write_str("active"),
            AgentStatus::Inactive => f.write_str("inactive"),
        }
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AgentStatus::Active),
            "inactive" => Ok(AgentStatus::Inactive),
            other => Err(format!(
                "Invalid status '{}'. Expected 'active' or 'inactive'",
                other
            )),
        }
    }
}

/// The fixed set of models an agent may be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "gpt-4.1-nano")]
    Gpt41Nano,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [ModelId::Gpt41Nano, ModelId::Gpt4, ModelId::Gpt35Turbo];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt41Nano => "gpt-4.1-nano",
            ModelId::Gpt4 => "gpt-4",
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid model '{}'. Expected one of: {}",
                    s,
                    ModelId::ALL.map(|m| m.as_str()).join(", ")
                )
            })
    }
}

/// Agent configuration as submitted for registration (no id, timestamp or status yet)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub model: ModelId,
    #[serde(default)]
    pub tools: Vec<String>,
    /// Generated agent-definition artifact, kept for reference and export
    #[serde(default)]
    pub code: String,
}

/// A registered agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: AgentId,
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub model: ModelId,
    pub tools: Vec<String>,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub status: AgentStatus,
}

impl AgentRecord {
    /// Materialize a draft under the given id, created now and active.
    pub fn from_draft(id: AgentId, draft: AgentDraft) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            system_prompt: draft.system_prompt,
            model: draft.model,
            tools: draft.tools,
            code: draft.code,
            created_at: Utc::now(),
            status: AgentStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }
}
