// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Agent Code Generator
//!
//! Renders the agent-definition artifact stored alongside every agent record,
//! using Handlebars for placeholder substitution. The artifact is kept for
//! display and export; it is never executed.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn a validated create request into a TypeScript agent module
//! - **Integration:** AgentService::create_agent → AgentRecord.code
//!
//! # Template Variables
//!
//! - `{{agent_var}}` - Agent name with whitespace removed, lowercased
//! - `{{name}}` / `{{model}}` / `{{instructions}}` - Copied from the request
//! - `{{tool_imports}}` - One import line per tool
//! - `{{tool_list}}` - Comma-separated tool variables (tools line omitted when empty)

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;

use crate::domain::agent::ModelId;

const AGENT_TEMPLATE_NAME: &str = "agent";

const AGENT_TEMPLATE: &str = r#"
import { Agent } from "@mastra/core/agent";
import { openai } from "@ai-sdk/openai";
import { Memory } from "@mastra/memory";
import { LibSQLStore } from "@mastra/libsql";
{{tool_imports}}

const memory = new Memory({
  storage: new LibSQLStore({
    url: `file:./mastra.db`,
  }),
  options: {
    semanticRecall: false,
    workingMemory: { enabled: false },
    lastMessages: {{memory_last_messages}}
  },
});

export const {{agent_var}}Agent = new Agent({
  name: "{{name}}",
  instructions: `{{instructions}}`,
  model: openai("{{model}}"),
  memory,
  {{#if tool_list}}tools: [{{tool_list}}],{{/if}}
});

// REST API endpoint for this agent
export async function handleAgentRequest(request: any) {
  try {
    const result = await {{agent_var}}Agent.generate(request.prompt || request.message);
    return {
      success: true,
      result: result.text,
      agent: "{{name}}",
      model: "{{model}}"
    };
  } catch (error) {
    return {
      success: false,
      error: error instanceof Error ? error.message : "Agent execution failed"
    };
  }
}
"#;

/// Fields the generator needs from a create request
#[derive(Debug, Clone)]
pub struct AgentCodeSpec<'a> {
    pub name: &'a str,
    pub system_prompt: &'a str,
    pub model: ModelId,
    pub tools: &'a [String],
}

#[derive(Serialize)]
struct AgentCodeContext {
    agent_var: String,
    name: String,
    instructions: String,
    model: &'static str,
    tool_imports: String,
    tool_list: String,
    memory_last_messages: usize,
}

pub struct AgentCodeGenerator {
    handlebars: Handlebars<'static>,
    memory_last_messages: usize,
}

impl AgentCodeGenerator {
    /// Create a generator with the built-in template; `memory_last_messages`
    /// is written into the generated memory block
    pub fn new(memory_last_messages: usize) -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Output is source code, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars
            .register_template_string(AGENT_TEMPLATE_NAME, AGENT_TEMPLATE)
            .context("Invalid agent code template")?;

        Ok(Self {
            handlebars,
            memory_last_messages,
        })
    }

    /// Render the agent module for `spec`
    pub fn generate(&self, spec: &AgentCodeSpec<'_>) -> Result<String> {
        let tool_vars: Vec<String> = spec.tools.iter().map(|id| tool_variable(id)).collect();

        let context = AgentCodeContext {
            agent_var: agent_variable(spec.name),
            name: spec.name.to_string(),
            instructions: spec.system_prompt.to_string(),
            model: spec.model.as_str(),
            tool_imports: tool_vars
                .iter()
                .map(|var| format!("import {{ {} }} from \"../tools\";", var))
                .collect::<Vec<_>>()
                .join("\n"),
            tool_list: tool_vars.join(", "),
            memory_last_messages: self.memory_last_messages,
        };

        let rendered = self
            .handlebars
            .render(AGENT_TEMPLATE_NAME, &context)
            .context("Failed to render agent code template")?;

        Ok(rendered.trim().to_string())
    }
}

/// Agent name with all whitespace removed, lowercased
pub fn agent_variable(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Variable a tool id is imported as
pub fn tool_variable(tool_id: &str) -> String {
    match tool_id {
        "get_weather" => "weatherTool".to_string(),
        other => format!("{}Tool", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(name: &str, tools: &[String]) -> String {
        AgentCodeGenerator::new(5)
            .unwrap()
            .generate(&AgentCodeSpec {
                name,
                system_prompt: "You report the weather.",
                model: ModelId::Gpt41Nano,
                tools,
            })
            .unwrap()
    }

    #[test]
    fn test_agent_variable() {
        assert_eq!(agent_variable("Weather Bot"), "weatherbot");
        assert_eq!(agent_variable("  My\tCool  Agent "), "mycoolagent");
    }

    #[test]
    fn test_tool_variable() {
        assert_eq!(tool_variable("get_weather"), "weatherTool");
        assert_eq!(tool_variable("search"), "searchTool");
    }

    #[test]
    fn test_weather_bot_code() {
        let code = render("Weather Bot", &["get_weather".to_string()]);

        assert!(code.starts_with("import { Agent } from \"@mastra/core/agent\";"));
        assert!(code.contains("import { weatherTool } from \"../tools\";"));
        assert!(code.contains("export const weatherbotAgent = new Agent({"));
        assert!(code.contains("name: \"Weather Bot\","));
        assert!(code.contains("instructions: `You report the weather.`,"));
        assert!(code.contains("model: openai(\"gpt-4.1-nano\"),"));
        assert!(code.contains("tools: [weatherTool],"));
        assert!(code.contains("lastMessages: 5"));
        assert!(code.contains("export async function handleAgentRequest"));
        assert!(code.ends_with('}'));
    }

    #[test]
    fn test_no_tools_omits_tools_line() {
        let code = render("Plain", &[]);
        assert!(!code.contains("tools: ["));
        assert!(!code.contains("from \"../tools\""));
    }

    #[test]
    fn test_names_are_not_html_escaped() {
        let code = render("Tom & \"Jerry\"", &["search".to_string(), "get_weather".to_string()]);
        assert!(code.contains("name: \"Tom & \"Jerry\"\","));
        assert!(code.contains("tools: [searchTool, weatherTool],"));
    }

    #[test]
    fn test_memory_window_is_configurable() {
        let code = AgentCodeGenerator::new(12)
            .unwrap()
            .generate(&AgentCodeSpec {
                name: "Chatty",
                system_prompt: "You chat.",
                model: ModelId::Gpt4,
                tools: &[],
            })
            .unwrap();
        assert!(code.contains("lastMessages: 12"));
    }
}
