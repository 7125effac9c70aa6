// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Agent Executor
//!
//! Builds live [`AgentHandle`]s from stored records and keeps them in a
//! process-local cache keyed by agent id.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Handle construction, caching and invocation
//!
//! A cached handle is a snapshot of the record it was built from. Updating
//! the record does not refresh the handle; callers rebuild it explicitly with
//! [`AgentExecutor::create_agent_from_stored`].

use crate::domain::agent::{AgentId, AgentRecord};
use crate::domain::handle::{AgentHandle, HandleSettings};
use crate::infrastructure::llm::ProviderRegistry;
use crate::infrastructure::tools::ToolCatalog;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Agent {agent_id} not found in cache. Please recreate the agent.")]
    NotCached { agent_id: AgentId },

    #[error("Agent execution failed: {message}")]
    ExecutionFailed { agent_id: AgentId, message: String },
}

pub struct AgentExecutor {
    cache: RwLock<HashMap<AgentId, Arc<AgentHandle>>>,
    catalog: Arc<ToolCatalog>,
    providers: Arc<ProviderRegistry>,
    settings: HandleSettings,
}

impl AgentExecutor {
    pub fn new(
        catalog: Arc<ToolCatalog>,
        providers: Arc<ProviderRegistry>,
        settings: HandleSettings,
    ) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            catalog,
            providers,
            settings,
        }
    }

    /// Build a handle for `record` and cache it, replacing any previous one.
    ///
    /// Tool ids the catalog does not know are dropped; each drop is logged and
    /// kept on the handle.
    pub fn create_agent_from_stored(&self, record: &AgentRecord) -> Arc<AgentHandle> {
        let (tools, dropped) = self.catalog.resolve(&record.tools);
        for tool_id in &dropped {
            warn!(
                "Agent {} references unknown tool '{}', dropping it (known tools: {:?})",
                record.id,
                tool_id,
                self.catalog.ids()
            );
        }

        let handle = Arc::new(AgentHandle::new(
            record,
            tools,
            dropped,
            self.providers.provider_for(record.model),
            self.settings.clone(),
        ));

        let replaced = self
            .cache
            .write()
            .insert(record.id.clone(), handle.clone())
            .is_some();

        info!(
            "Cached agent {} (model: {}, tools: {:?}, replaced: {})",
            record.id,
            record.model,
            handle.tool_ids(),
            replaced
        );
        handle
    }

    /// Run the cached handle for `agent_id` against `prompt`.
    pub async fn execute_agent(&self, agent_id: &AgentId, prompt: &str) -> Result<String, ExecutorError> {
        let Some(handle) = self.cache.read().get(agent_id).cloned() else {
            metrics::counter!("agentforge_executions_total", "outcome" => "not_cached").increment(1);
            return Err(ExecutorError::NotCached {
                agent_id: agent_id.clone(),
            });
        };

        debug!("Executing agent {} ({} prompt chars)", agent_id, prompt.chars().count());

        match handle.generate(prompt).await {
            Ok(text) => {
                metrics::counter!("agentforge_executions_total", "outcome" => "ok").increment(1);
                Ok(text)
            }
            Err(e) => {
                error!("Agent {} execution failed: {}", agent_id, e);
                metrics::counter!("agentforge_executions_total", "outcome" => "failed").increment(1);
                Err(ExecutorError::ExecutionFailed {
                    agent_id: agent_id.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.write();
        info!("Clearing {} cached agent handles", cache.len());
        cache.clear();
    }

    pub fn is_agent_cached(&self, agent_id: &AgentId) -> bool {
        self.cache.read().contains_key(agent_id)
    }

    /// Drop one cached handle, returning whether it was present
    pub fn evict(&self, agent_id: &AgentId) -> bool {
        self.cache.write().remove(agent_id).is_some()
    }

    pub fn cached_handle(&self, agent_id: &AgentId) -> Option<Arc<AgentHandle>> {
        self.cache.read().get(agent_id).cloned()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentDraft, ModelId};
    use crate::domain::llm::{
        ChatRequest, ChatResponse, FinishReason, LLMError, LLMProvider, TokenUsage,
    };
    use async_trait::async_trait;

    struct FixedProvider(Result<&'static str, &'static str>);

    #[async_trait]
    impl LLMProvider for FixedProvider {
        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, LLMError> {
            match self.0 {
                Ok(text) => Ok(ChatResponse {
                    text: text.to_string(),
                    tool_calls: vec![],
                    usage: TokenUsage::default(),
                    provider: "fixed".into(),
                    model: "m".into(),
                    finish_reason: FinishReason::Stop,
                }),
                Err(message) => Err(LLMError::Provider(message.to_string())),
            }
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn executor(reply: Result<&'static str, &'static str>) -> AgentExecutor {
        AgentExecutor::new(
            Arc::new(ToolCatalog::builtin()),
            Arc::new(ProviderRegistry::uniform("fixed", Arc::new(FixedProvider(reply)))),
            HandleSettings::default(),
        )
    }

    fn record(id: &str, tools: &[&str]) -> AgentRecord {
        AgentRecord::from_draft(
            AgentId::from(id),
            AgentDraft {
                name: "Test".into(),
                description: "A test agent".into(),
                system_prompt: "You are a test agent.".into(),
                model: ModelId::Gpt4,
                tools: tools.iter().map(|t| t.to_string()).collect(),
                code: String::new(),
            },
        )
    }

    #[tokio::test]
    async fn test_execute_cached() {
        let executor = executor(Ok("hi there"));
        executor.create_agent_from_stored(&record("a", &[]));

        assert!(executor.is_agent_cached(&AgentId::from("a")));
        assert_eq!(
            executor.execute_agent(&AgentId::from("a"), "hello").await.unwrap(),
            "hi there"
        );
    }

    #[tokio::test]
    async fn test_not_cached_carries_id() {
        let executor = executor(Ok("x"));
        let err = executor
            .execute_agent(&AgentId::from("nonexistent"), "hello")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ExecutorError::NotCached {
                agent_id: AgentId::from("nonexistent")
            }
        );
        assert!(err.to_string().contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_execution_failure_keeps_message() {
        let executor = executor(Err("quota exceeded"));
        executor.create_agent_from_stored(&record("a", &[]));

        let err = executor.execute_agent(&AgentId::from("a"), "hello").await.unwrap_err();
        match err {
            ExecutorError::ExecutionFailed { agent_id, message } => {
                assert_eq!(agent_id, AgentId::from("a"));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_tools_dropped() {
        let executor = executor(Ok("x"));
        let handle = executor.create_agent_from_stored(&record("a", &["nonexistent_tool"]));

        assert!(handle.tool_ids().is_empty());
        assert_eq!(handle.dropped_tools(), ["nonexistent_tool".to_string()]);
    }

    #[test]
    fn test_recreate_overwrites_and_clear() {
        let executor = executor(Ok("x"));
        let first = executor.create_agent_from_stored(&record("a", &[]));
        let second = executor.create_agent_from_stored(&record("a", &["get_weather"]));

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(executor.cached_count(), 1);
        assert_eq!(
            executor.cached_handle(&AgentId::from("a")).unwrap().tool_ids(),
            vec!["get_weather"]
        );

        executor.create_agent_from_stored(&record("b", &[]));
        executor.clear_cache();
        assert!(!executor.is_agent_cached(&AgentId::from("a")));
        assert!(!executor.is_agent_cached(&AgentId::from("b")));
    }

    #[test]
    fn test_evict() {
        let executor = executor(Ok("x"));
        executor.create_agent_from_stored(&record("a", &[]));
        assert!(executor.evict(&AgentId::from("a")));
        assert!(!executor.evict(&AgentId::from("a")));
    }
}
