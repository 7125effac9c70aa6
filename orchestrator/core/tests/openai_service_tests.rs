// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end service tests against a mock OpenAI-compatible endpoint.

use agentforge_core::application::validation::CreateAgentRequest;
use agentforge_core::domain::node_config::{LLMProviderConfig, ModelConfig, NodeConfig};
use agentforge_core::AgentService;
use mockito::Matcher;

fn config(endpoint: String) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.spec.llm_providers = vec![LLMProviderConfig {
        name: "mock-openai".to_string(),
        provider_type: "openai-compatible".to_string(),
        endpoint,
        api_key: Some("sk-test".to_string()),
        enabled: true,
        models: vec![ModelConfig {
            alias: "gpt-4".to_string(),
            model: "gpt-4o-mini".to_string(),
        }],
    }];
    config
}

fn create_request(model: &str) -> CreateAgentRequest {
    CreateAgentRequest {
        name: Some("Support Agent".to_string()),
        description: Some("Answers support questions".to_string()),
        system_prompt: Some("You answer support questions politely.".to_string()),
        model: Some(model.to_string()),
        tools: None,
    }
}

#[tokio::test]
async fn test_execute_through_openai_adapter() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                { "role": "system", "content": "You answer support questions politely." },
                { "role": "user", "content": "How do I reset my password?" }
            ]
        })))
        .with_status(200)
        .with_body(
            r#"{"choices":[{"message":{"role":"assistant","content":"Use the reset link."},"finish_reason":"stop"}]}"#,
        )
        .create_async()
        .await;

    let service = AgentService::from_config(&config(server.url())).unwrap();
    assert_eq!(service.available_models().len(), 1);

    let created = service.create_agent(create_request("gpt-4")).await.unwrap();
    let reply = service
        .execute_agent(&created.agent_id, "How do I reset my password?")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(reply, "Use the reset link.");
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_execution_failed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let service = AgentService::from_config(&config(server.url())).unwrap();
    let created = service.create_agent(create_request("gpt-4")).await.unwrap();

    let err = service
        .execute_agent(&created.agent_id, "hello")
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
    assert!(err.to_string().contains("upstream exploded"));
}

#[tokio::test]
async fn test_unmapped_model_still_creates() {
    let server = mockito::Server::new_async().await;
    let service = AgentService::from_config(&config(server.url())).unwrap();

    // gpt-3.5-turbo has no route in this config
    let created = service.create_agent(create_request("gpt-3.5-turbo")).await.unwrap();
    assert!(service.executor().is_agent_cached(&created.agent_id));

    let err = service
        .execute_agent(&created.agent_id, "hello")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("gpt-3.5-turbo"));
}
