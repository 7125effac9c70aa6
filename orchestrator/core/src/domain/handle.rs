// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Agent Handle
//!
//! The live, invocable form of an agent: a snapshot of a record's model,
//! instructions and resolved tools bound to an LLM provider.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Tool-calling generation loop and short conversation memory
//!
//! # Memory
//!
//! A handle keeps one conversation buffer. There are no per-caller threads:
//! every caller of the same agent sees the last `memory_last_messages`
//! messages of every other caller. Evicting or rebuilding the handle
//! starts a fresh buffer.

use crate::domain::agent::{AgentId, AgentRecord, ModelId};
use crate::domain::llm::{ChatMessage, ChatRequest, GenerationOptions, LLMError, LLMProvider, ToolCall};
use crate::domain::tool::Tool;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reply used when the model finishes without producing any text
pub const EMPTY_REPLY: &str = "No response generated";

/// Per-handle generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct HandleSettings {
    pub options: GenerationOptions,
    /// Upper bound on model round-trips that answer tool calls
    pub max_tool_steps: u32,
    /// Number of most recent messages replayed on each call
    pub memory_last_messages: usize,
}

impl Default for HandleSettings {
    fn default() -> Self {
        Self {
            options: GenerationOptions::default(),
            max_tool_steps: 5,
            memory_last_messages: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] LLMError),

    #[error("Tool step limit of {0} reached without a final answer")]
    ToolStepLimit(u32),
}

pub struct AgentHandle {
    agent_id: AgentId,
    name: String,
    model: ModelId,
    instructions: String,
    tools: Vec<Arc<dyn Tool>>,
    dropped_tools: Vec<String>,
    provider: Arc<dyn LLMProvider>,
    settings: HandleSettings,
    memory: Mutex<VecDeque<ChatMessage>>,
}

impl AgentHandle {
    pub fn new(
        record: &AgentRecord,
        tools: Vec<Arc<dyn Tool>>,
        dropped_tools: Vec<String>,
        provider: Arc<dyn LLMProvider>,
        settings: HandleSettings,
    ) -> Self {
        Self {
            agent_id: record.id.clone(),
            name: record.name.clone(),
            model: record.model,
            instructions: record.system_prompt.clone(),
            tools,
            dropped_tools,
            provider,
            settings,
            memory: Mutex::new(VecDeque::new()),
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Ids of the tools this handle can call, in record order
    pub fn tool_ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id()).collect()
    }

    /// Tool ids from the record that the catalog did not know
    pub fn dropped_tools(&self) -> &[String] {
        &self.dropped_tools
    }

    /// Messages currently held in conversation memory
    pub fn memory_len(&self) -> usize {
        self.memory.lock().len()
    }

    /// Produce a reply for `prompt`, answering tool calls along the way.
    pub async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let remembered: Vec<ChatMessage> = self.memory.lock().iter().cloned().collect();
        let mut messages = Vec::with_capacity(remembered.len() + 2);
        messages.push(ChatMessage::system(&self.instructions));
        messages.extend(remembered);
        messages.push(ChatMessage::user(prompt));

        let mut request = ChatRequest {
            model: self.model.as_str().to_string(),
            messages,
            tools: self.tools.iter().map(|t| t.spec()).collect(),
            options: self.settings.options.clone(),
        };

        let mut steps = 0;
        let text = loop {
            let response = self.provider.chat(&request).await?;

            if response.tool_calls.is_empty() {
                break response.text;
            }

            if steps >= self.settings.max_tool_steps {
                warn!(
                    "Agent {} exceeded tool step limit ({})",
                    self.agent_id, self.settings.max_tool_steps
                );
                return Err(GenerationError::ToolStepLimit(self.settings.max_tool_steps));
            }
            steps += 1;

            request.messages.push(ChatMessage::assistant_tool_calls(
                response.text,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                let content = self.run_tool(call).await;
                request.messages.push(ChatMessage::tool_result(&call.id, content));
            }
        };

        let text = if text.trim().is_empty() {
            EMPTY_REPLY.to_string()
        } else {
            text
        };

        self.remember(prompt, &text);
        Ok(text)
    }

    /// Run one requested tool; failures are reported to the model as content.
    async fn run_tool(&self, call: &ToolCall) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.id() == call.name) else {
            warn!("Agent {} requested unavailable tool '{}'", self.agent_id, call.name);
            return serde_json::json!({ "error": format!("Tool '{}' is not available", call.name) })
                .to_string();
        };

        debug!("Agent {} calling tool {}", self.agent_id, call.name);
        match tool.execute(call.arguments.clone()).await {
            Ok(value) => value.to_string(),
            Err(e) => {
                warn!("Tool {} failed for agent {}: {}", call.name, self.agent_id, e);
                serde_json::json!({ "error": e.to_string() }).to_string()
            }
        }
    }

    fn remember(&self, prompt: &str, reply: &str) {
        let limit = self.settings.memory_last_messages;
        let mut memory = self.memory.lock();
        memory.push_back(ChatMessage::user(prompt));
        memory.push_back(ChatMessage::assistant(reply));
        while memory.len() > limit {
            memory.pop_front();
        }
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("agent_id", &self.agent_id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tool_ids())
            .field("dropped_tools", &self.dropped_tools)
            .finish()
    }
}
