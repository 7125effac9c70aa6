// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for communicating with a running AgentForge server

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::Deserialize;

use agentforge_core::application::validation::CreateAgentRequest;
use agentforge_core::domain::agent::{AgentId, AgentRecord, AgentStatus};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    pub uptime_seconds: u64,
    #[serde(default)]
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAgentInfo {
    pub agent_id: AgentId,
    pub message: String,
    #[serde(default)]
    pub dropped_tools: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl ApiClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host.trim_end_matches('/'), port)
        } else {
            format!("http://{}:{}", host, port)
        };

        Ok(Self { client, base_url })
    }

    /// Client for an explicit base URL (e.g. `http://10.0.0.5:8000`)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .build()
                .context("Failed to create HTTP client")?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthInfo> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .with_context(|| format!("Failed to reach AgentForge server at {}", self.base_url))?;

        let response = check(response, "Health check failed").await?;
        response.json().await.context("Failed to parse health response")
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentRecord>> {
        #[derive(Deserialize)]
        struct ListResponse {
            agents: Vec<AgentRecord>,
        }

        let response = self
            .client
            .get(format!("{}/api/agents", self.base_url))
            .send()
            .await
            .context("Failed to list agents")?;

        let response = check(response, "Failed to list agents").await?;
        let list: ListResponse = response.json().await.context("Failed to parse agent list")?;
        Ok(list.agents)
    }

    pub async fn get_agent(&self, agent_id: &AgentId) -> Result<AgentRecord> {
        #[derive(Deserialize)]
        struct AgentResponse {
            agent: AgentRecord,
        }

        let response = self
            .client
            .get(format!("{}/api/agents/{}", self.base_url, agent_id))
            .send()
            .await
            .context("Failed to get agent")?;

        let response = check(response, "Failed to get agent").await?;
        let body: AgentResponse = response.json().await.context("Failed to parse agent")?;
        Ok(body.agent)
    }

    pub async fn create_agent(&self, request: &CreateAgentRequest) -> Result<CreatedAgentInfo> {
        let response = self
            .client
            .post(format!("{}/api/agents/create", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to create agent")?;

        let response = check(response, "Failed to create agent").await?;
        response.json().await.context("Failed to parse create response")
    }

    pub async fn delete_agent(&self, agent_id: &AgentId) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/api/agents/{}", self.base_url, agent_id))
            .send()
            .await
            .context("Failed to delete agent")?;

        check(response, "Failed to delete agent").await?;
        Ok(())
    }

    pub async fn set_status(&self, agent_id: &AgentId, status: AgentStatus) -> Result<AgentRecord> {
        #[derive(Deserialize)]
        struct StatusResponse {
            agent: AgentRecord,
        }

        let response = self
            .client
            .put(format!("{}/api/agents/{}/status", self.base_url, agent_id))
            .json(&serde_json::json!({ "status": status }))
            .send()
            .await
            .context("Failed to update agent status")?;

        let response = check(response, "Failed to update agent status").await?;
        let body: StatusResponse = response.json().await.context("Failed to parse agent")?;
        Ok(body.agent)
    }

    pub async fn execute_agent(&self, agent_id: &AgentId, prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct ExecuteResponse {
            result: String,
        }

        let response = self
            .client
            .post(format!("{}/api/agents/{}/execute", self.base_url, agent_id))
            .json(&serde_json::json!({ "prompt": prompt }))
            .send()
            .await
            .context("Failed to execute agent")?;

        let response = check(response, "Failed to execute agent").await?;
        let body: ExecuteResponse = response
            .json()
            .await
            .context("Failed to parse execute response")?;
        Ok(body.result)
    }
}

/// Turn a non-success response into an error carrying the server's message
async fn check(response: Response, what: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            error,
            details: Some(details),
        }) => format!("{}: {}", error, render_details(&details)),
        Ok(ErrorBody { error, details: None }) => error,
        Err(_) => text,
    };

    anyhow::bail!("{} ({}): {}", what, status, message)
}

fn render_details(details: &serde_json::Value) -> String {
    match details {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(issues) => issues
            .iter()
            .map(|issue| {
                let path = issue["path"]
                    .as_array()
                    .map(|p| {
                        p.iter()
                            .filter_map(|s| s.as_str())
                            .collect::<Vec<_>>()
                            .join(".")
                    })
                    .unwrap_or_default();
                let message = issue["message"].as_str().unwrap_or_default();
                if path.is_empty() {
                    message.to_string()
                } else {
                    format!("{}: {}", path, message)
                }
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(ApiClient::new("127.0.0.1", 8000).unwrap().base_url(), "http://127.0.0.1:8000");
        assert_eq!(
            ApiClient::new("https://node.example", 443).unwrap().base_url(),
            "https://node.example:443"
        );
    }

    #[tokio::test]
    async fn test_execute_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/agents/agent_1_abc/execute")
            .match_body(mockito::Matcher::Json(serde_json::json!({ "prompt": "hi" })))
            .with_status(200)
            .with_body(r#"{"success":true,"result":"hello","agentId":"agent_1_abc"}"#)
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url()).unwrap();
        let result = client
            .execute_agent(&AgentId::from("agent_1_abc"), "hi")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, "hello");
    }

    #[tokio::test]
    async fn test_validation_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/agents/create")
            .with_status(400)
            .with_body(
                r#"{"error":"Validation failed","details":[
                    {"code":"too_small","path":["description"],"message":"Description must be at least 10 characters"}]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url()).unwrap();
        let err = client
            .create_agent(&CreateAgentRequest::default())
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Validation failed"));
        assert!(message.contains("description: Description must be at least 10 characters"));
    }

    #[tokio::test]
    async fn test_health() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"healthy","uptime_seconds":42,"models":["gpt-4"]}"#)
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url()).unwrap();
        let health = client.health().await.unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.uptime_seconds, 42);
        assert_eq!(health.models, vec!["gpt-4".to_string()]);
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/agents/missing")
            .with_status(404)
            .with_body(r#"{"error":"Agent not found"}"#)
            .create_async()
            .await;

        let client = ApiClient::with_base_url(server.url()).unwrap();
        let err = client.get_agent(&AgentId::from("missing")).await.unwrap_err();
        assert!(err.to_string().contains("Agent not found"));
    }
}
