// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

// Request validation for agent creation and execution.
//
// Bounds are counted in characters. Every failing field is reported, not
// just the first.

use crate::domain::agent::ModelId;
use serde::{Deserialize, Serialize};

pub const NAME_MAX: usize = 50;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 500;
pub const SYSTEM_PROMPT_MIN: usize = 10;
pub const SYSTEM_PROMPT_MAX: usize = 2000;

/// Body of a create request. Unknown fields (wallet address, price and the
/// other marketplace fields) are accepted and ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub tools: Option<Vec<String>>,
}

/// One failed check, addressed by field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: String,
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(code: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            path: vec![field.to_string()],
            message: message.into(),
        }
    }
}

/// A create request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidAgentRequest {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub model: ModelId,
    pub tools: Vec<String>,
}

struct Bounds {
    min: usize,
    max: usize,
    too_short: &'static str,
    too_long: &'static str,
}

fn check_text(
    field: &str,
    value: Option<&str>,
    bounds: &Bounds,
    issues: &mut Vec<ValidationIssue>,
) -> String {
    let Some(value) = value else {
        issues.push(ValidationIssue::new("invalid_type", field, "Required"));
        return String::new();
    };

    let len = value.chars().count();
    if len < bounds.min {
        issues.push(ValidationIssue::new("too_small", field, bounds.too_short));
    } else if len > bounds.max {
        issues.push(ValidationIssue::new("too_big", field, bounds.too_long));
    }
    value.to_string()
}

impl CreateAgentRequest {
    pub fn validate(&self) -> Result<ValidAgentRequest, Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let name = check_text(
            "name",
            self.name.as_deref(),
            &Bounds {
                min: 1,
                max: NAME_MAX,
                too_short: "Agent name is required",
                too_long: "Agent name is too long",
            },
            &mut issues,
        );
        let description = check_text(
            "description",
            self.description.as_deref(),
            &Bounds {
                min: DESCRIPTION_MIN,
                max: DESCRIPTION_MAX,
                too_short: "Description must be at least 10 characters",
                too_long: "Description is too long",
            },
            &mut issues,
        );
        let system_prompt = check_text(
            "systemPrompt",
            self.system_prompt.as_deref(),
            &Bounds {
                min: SYSTEM_PROMPT_MIN,
                max: SYSTEM_PROMPT_MAX,
                too_short: "System prompt must be at least 10 characters",
                too_long: "System prompt is too long",
            },
            &mut issues,
        );

        let model = match self.model.as_deref() {
            None => {
                issues.push(ValidationIssue::new("invalid_type", "model", "Required"));
                None
            }
            Some(raw) => match raw.parse::<ModelId>() {
                Ok(model) => Some(model),
                Err(_) => {
                    let expected = ModelId::ALL
                        .iter()
                        .map(|m| format!("'{}'", m))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    issues.push(ValidationIssue::new(
                        "invalid_enum_value",
                        "model",
                        format!("Invalid enum value. Expected {}, received '{}'", expected, raw),
                    ));
                    None
                }
            },
        };

        match model {
            Some(model) if issues.is_empty() => Ok(ValidAgentRequest {
                name,
                description,
                system_prompt,
                model,
                tools: self.tools.clone().unwrap_or_default(),
            }),
            _ => Err(issues),
        }
    }
}

/// Issue reported when a request body is not the expected JSON shape
pub fn malformed_body(message: impl Into<String>) -> ValidationIssue {
    ValidationIssue {
        code: "invalid_type".to_string(),
        path: Vec::new(),
        message: message.into(),
    }
}

/// Execution prompt check: present and not blank
pub fn validate_prompt(prompt: &str) -> Result<(), Vec<ValidationIssue>> {
    if prompt.trim().is_empty() {
        return Err(vec![ValidationIssue::new(
            "too_small",
            "prompt",
            "Prompt is required and must be a string",
        )]);
    }
    Ok(())
}
