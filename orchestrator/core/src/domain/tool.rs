// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Tool
//!
//! Capabilities an agent may invoke while generating a reply.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** `Tool` port; the fixed catalog lives in `infrastructure::tools`

use crate::domain::llm::ToolSpec;
use async_trait::async_trait;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Catalog identifier, also the function name advertised to the model
    fn id(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the arguments object
    fn parameters(&self) -> serde_json::Value;

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.id().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid arguments for tool {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Tool {tool} failed: {message}")]
    Failed { tool: String, message: String },
}
