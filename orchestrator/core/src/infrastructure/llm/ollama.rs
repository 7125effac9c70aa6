// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

// Ollama LLM Provider Adapter
//
// Anti-Corruption Layer for Ollama local models via /api/chat.
// Supports air-gapped deployments with local LLMs

use crate::domain::llm::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, FinishReason, LLMError, LLMProvider,
    TokenUsage, ToolCall,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub struct OllamaAdapter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
}

#[derive(Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    eval_count: Option<u32>,
    prompt_eval_count: Option<u32>,
}

impl OllamaAdapter {
    pub fn new(endpoint: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            model,
        }
    }
}

impl From<&ChatMessage> for OllamaMessage {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        };
        Self {
            role: role.to_string(),
            content: message.content.clone(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| OllamaToolCall {
                    function: OllamaFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
        }
    }
}

#[async_trait]
impl LLMProvider for OllamaAdapter {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LLMError> {
        let body = OllamaRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            tools: request
                .tools
                .iter()
                .map(|spec| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": spec.name,
                            "description": spec.description,
                            "parameters": spec.parameters,
                        }
                    })
                })
                .collect(),
            stream: false,
            options: Some(OllamaOptions {
                temperature: request.options.temperature,
                num_predict: request.options.max_tokens.map(|t| t as i32),
                stop: request.options.stop_sequences.clone(),
            }),
        };

        let url = format!("{}/api/chat", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(if status == 404 {
                LLMError::ModelNotFound(self.model.clone())
            } else {
                LLMError::Provider(format!("HTTP {}: {}", status, error_text))
            });
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LLMError::Provider(format!("Failed to parse response: {}", e)))?;

        // Ollama does not assign call ids
        let tool_calls: Vec<ToolCall> = ollama_response
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, call)| ToolCall {
                id: format!("call_{}", i),
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        let prompt_tokens = ollama_response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = ollama_response.eval_count.unwrap_or(0);

        Ok(ChatResponse {
            text: ollama_response.message.content,
            usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            provider: "ollama".to_string(),
            model: self.model.clone(),
            finish_reason: if !tool_calls.is_empty() {
                FinishReason::ToolCalls
            } else if ollama_response.done && ollama_response.done_reason.as_deref() != Some("length") {
                FinishReason::Stop
            } else {
                FinishReason::Length
            },
            tool_calls,
        })
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        // Check if Ollama server is running by listing models
        let url = format!("{}/api/tags", self.endpoint.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LLMError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LLMError::Network(format!("HTTP {}", response.status())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{GenerationOptions, ToolSpec};

    #[tokio::test]
    async fn test_chat_with_tool_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "llama3.2",
                "stream": false
            })))
            .with_status(200)
            .with_body(
                r#"{"message":{"role":"assistant","content":"",
                    "tool_calls":[{"function":{"name":"get_weather","arguments":{"location":"Oslo"}}}]},
                    "done":true,"prompt_eval_count":7,"eval_count":3}"#,
            )
            .create_async()
            .await;

        let adapter = OllamaAdapter::new(server.url(), "llama3.2".into());
        let request = ChatRequest {
            model: "gpt-4".into(),
            messages: vec![ChatMessage::user("weather in Oslo")],
            tools: vec![ToolSpec {
                name: "get_weather".into(),
                description: "Get weather".into(),
                parameters: serde_json::json!({ "type": "object" }),
            }],
            options: GenerationOptions::default(),
        };
        let response = adapter.chat(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.tool_calls[0].id, "call_0");
        assert_eq!(response.tool_calls[0].arguments["location"], "Oslo");
        assert_eq!(response.usage.total_tokens, 10);
    }
}
