// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Agent Service
//!
//! Application façade over the registry, the executor and the code generator.
//! Constructed once at startup and shared with the HTTP layer behind `Arc`.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Create / list / get / delete / set-status / execute flows
//!
//! # Flows
//!
//! - **create**: validate → generate code → save record → build and cache handle
//! - **execute**: validate prompt → run cached handle; on a cache miss the
//!   handle is rebuilt from the current record when `rebuild_on_miss` is set
//! - **delete**: remove record and evict its handle
//!
//! Caching a handle re-reads the registry afterwards and evicts again if the
//! record was deleted in between, so a concurrent delete cannot leave a live
//! handle behind.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::executor::{AgentExecutor, ExecutorError};
use crate::application::registry::AgentRegistry;
use crate::application::validation::{validate_prompt, CreateAgentRequest, ValidationIssue};
use crate::domain::agent::{AgentDraft, AgentId, AgentRecord, AgentStatus, ModelId};
use crate::domain::handle::AgentHandle;
use crate::domain::node_config::NodeConfig;
use crate::domain::repository::{AgentRepository, RepositoryError};
use crate::infrastructure::agent_code_generator::{AgentCodeGenerator, AgentCodeSpec};
use crate::infrastructure::llm::ProviderRegistry;
use crate::infrastructure::repositories::InMemoryAgentRepository;
use crate::infrastructure::tools::ToolCatalog;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed")]
    Validation(Vec<ValidationIssue>),

    #[error("Agent not found: {agent_id}")]
    NotFound { agent_id: AgentId },

    #[error("Agent execution failed: {message}")]
    ExecutionFailed { agent_id: AgentId, message: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Validation(_))
    }
}

/// Result of a successful create
#[derive(Debug, Clone)]
pub struct CreatedAgent {
    pub agent_id: AgentId,
    pub name: String,
    /// Requested tool ids the catalog does not provide
    pub dropped_tools: Vec<String>,
}

impl CreatedAgent {
    pub fn message(&self) -> String {
        format!("Agent \"{}\" created successfully!", self.name)
    }
}

pub struct AgentService {
    registry: AgentRegistry,
    executor: AgentExecutor,
    code_generator: AgentCodeGenerator,
    rebuild_on_miss: bool,
}

impl AgentService {
    pub fn new(
        registry: AgentRegistry,
        executor: AgentExecutor,
        code_generator: AgentCodeGenerator,
        rebuild_on_miss: bool,
    ) -> Self {
        Self {
            registry,
            executor,
            code_generator,
            rebuild_on_miss,
        }
    }

    /// Wire the service from node configuration with in-memory storage and the
    /// built-in tool catalog.
    pub fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        let providers = ProviderRegistry::from_config(config)?;
        Self::with_providers(config, providers)
    }

    /// Same as [`AgentService::from_config`] with a caller-supplied provider registry
    pub fn with_providers(config: &NodeConfig, providers: ProviderRegistry) -> anyhow::Result<Self> {
        let repository: Arc<dyn AgentRepository> = Arc::new(InMemoryAgentRepository::new());
        let executor = AgentExecutor::new(
            Arc::new(ToolCatalog::builtin()),
            Arc::new(providers),
            config.spec.executor.handle_settings(),
        );

        Ok(Self::new(
            AgentRegistry::new(repository),
            executor,
            AgentCodeGenerator::new(config.spec.executor.memory_last_messages)?,
            config.spec.executor.rebuild_on_miss,
        ))
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    /// Agent models that have a configured provider
    pub fn available_models(&self) -> Vec<ModelId> {
        self.executor.providers().available_models()
    }

    pub async fn create_agent(&self, request: CreateAgentRequest) -> Result<CreatedAgent, ServiceError> {
        let valid = request.validate().map_err(ServiceError::Validation)?;

        let code = self
            .code_generator
            .generate(&AgentCodeSpec {
                name: &valid.name,
                system_prompt: &valid.system_prompt,
                model: valid.model,
                tools: &valid.tools,
            })
            .map_err(|e| ServiceError::Internal(format!("{:#}", e)))?;

        let agent_id = self
            .registry
            .save_agent(AgentDraft {
                name: valid.name.clone(),
                description: valid.description,
                system_prompt: valid.system_prompt,
                model: valid.model,
                tools: valid.tools,
                code,
            })
            .await?;

        let record = self
            .registry
            .get_agent(&agent_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound {
                agent_id: agent_id.clone(),
            })?;
        let handle = self.cache_handle(&record).await?;

        metrics::counter!("agentforge_agents_created_total").increment(1);
        info!("Agent \"{}\" created as {}", valid.name, agent_id);

        Ok(CreatedAgent {
            agent_id,
            name: valid.name,
            dropped_tools: handle.dropped_tools().to_vec(),
        })
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentRecord>, ServiceError> {
        Ok(self.registry.get_all_agents().await?)
    }

    pub async fn get_agent(&self, agent_id: &AgentId) -> Result<AgentRecord, ServiceError> {
        self.registry
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound {
                agent_id: agent_id.clone(),
            })
    }

    pub async fn delete_agent(&self, agent_id: &AgentId) -> Result<(), ServiceError> {
        if !self.registry.delete_agent(agent_id).await? {
            return Err(ServiceError::NotFound {
                agent_id: agent_id.clone(),
            });
        }
        self.executor.evict(agent_id);
        info!("Deleted agent {}", agent_id);
        Ok(())
    }

    /// Set a record's status and return the updated record.
    ///
    /// Status is informational; the cached handle is left as it is.
    pub async fn set_agent_status(
        &self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> Result<AgentRecord, ServiceError> {
        if !self.registry.update_agent_status(agent_id, status).await? {
            return Err(ServiceError::NotFound {
                agent_id: agent_id.clone(),
            });
        }
        self.get_agent(agent_id).await
    }

    pub async fn execute_agent(&self, agent_id: &AgentId, prompt: &str) -> Result<String, ServiceError> {
        validate_prompt(prompt).map_err(ServiceError::Validation)?;

        match self.executor.execute_agent(agent_id, prompt).await {
            Err(ExecutorError::NotCached { .. }) if self.rebuild_on_miss => {
                let Some(record) = self.registry.get_agent(agent_id).await? else {
                    return Err(ServiceError::NotFound {
                        agent_id: agent_id.clone(),
                    });
                };
                warn!("Agent {} missing from cache, rebuilding from registry", agent_id);
                self.cache_handle(&record).await?;
                self.executor
                    .execute_agent(agent_id, prompt)
                    .await
                    .map_err(Self::map_executor_error)
            }
            result => result.map_err(Self::map_executor_error),
        }
    }

    /// Build and cache a handle for `record` unless the record has since been deleted.
    async fn cache_handle(&self, record: &AgentRecord) -> Result<Arc<AgentHandle>, ServiceError> {
        let handle = self.executor.create_agent_from_stored(record);
        if self.registry.get_agent(&record.id).await?.is_none() {
            self.executor.evict(&record.id);
            warn!("Agent {} was deleted while its handle was being built", record.id);
            return Err(ServiceError::NotFound {
                agent_id: record.id.clone(),
            });
        }
        Ok(handle)
    }

    fn map_executor_error(err: ExecutorError) -> ServiceError {
        match err {
            ExecutorError::NotCached { agent_id } => ServiceError::NotFound { agent_id },
            ExecutorError::ExecutionFailed { agent_id, message } => {
                ServiceError::ExecutionFailed { agent_id, message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{
        ChatRequest, ChatResponse, FinishReason, LLMError, LLMProvider, TokenUsage,
    };
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Parrot;

    #[async_trait]
    impl LLMProvider for Parrot {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LLMError> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(ChatResponse {
                text: format!("you said: {}", last),
                tool_calls: vec![],
                usage: TokenUsage::default(),
                provider: "parrot".into(),
                model: request.model.clone(),
                finish_reason: FinishReason::Stop,
            })
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn service(rebuild_on_miss: bool) -> AgentService {
        let mut config = NodeConfig::default();
        config.spec.executor.rebuild_on_miss = rebuild_on_miss;
        AgentService::with_providers(&config, ProviderRegistry::uniform("parrot", Arc::new(Parrot)))
            .unwrap()
    }

    fn request(tools: &[&str]) -> CreateAgentRequest {
        CreateAgentRequest {
            name: Some("Weather Bot".into()),
            description: Some("Reports the weather".into()),
            system_prompt: Some("You are a weather assistant.".into()),
            model: Some("gpt-4.1-nano".into()),
            tools: Some(tools.iter().map(|t| t.to_string()).collect()),
        }
    }

    #[tokio::test]
    async fn test_create_stores_code_and_caches_handle() {
        let service = service(true);
        let created = service.create_agent(request(&["get_weather"])).await.unwrap();

        assert_eq!(created.message(), "Agent \"Weather Bot\" created successfully!");
        assert!(created.dropped_tools.is_empty());
        assert!(service.executor().is_agent_cached(&created.agent_id));

        let record = service.get_agent(&created.agent_id).await.unwrap();
        assert!(record.code.contains("export const weatherbotAgent"));
    }

    #[tokio::test]
    async fn test_create_reports_dropped_tools() {
        let service = service(true);
        let created = service.create_agent(request(&["nonexistent_tool"])).await.unwrap();
        assert_eq!(created.dropped_tools, vec!["nonexistent_tool"]);
    }

    #[tokio::test]
    async fn test_create_validation_error() {
        let service = service(true);
        let err = service
            .create_agent(CreateAgentRequest {
                description: Some("short".into()),
                ..request(&[])
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(service.list_agents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_evicts_handle() {
        let service = service(true);
        let created = service.create_agent(request(&[])).await.unwrap();

        service.delete_agent(&created.agent_id).await.unwrap();
        assert!(!service.executor().is_agent_cached(&created.agent_id));

        let err = service.execute_agent(&created.agent_id, "hi").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(service.delete_agent(&created.agent_id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rebuild_on_miss() {
        let service = service(true);
        let created = service.create_agent(request(&[])).await.unwrap();
        service.executor().clear_cache();

        let reply = service.execute_agent(&created.agent_id, "hello").await.unwrap();
        assert_eq!(reply, "you said: hello");
        assert!(service.executor().is_agent_cached(&created.agent_id));
    }

    #[tokio::test]
    async fn test_miss_without_rebuild_is_not_found() {
        let service = service(false);
        let created = service.create_agent(request(&[])).await.unwrap();
        service.executor().clear_cache();

        let err = service.execute_agent(&created.agent_id, "hello").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected() {
        let service = service(true);
        let created = service.create_agent(request(&[])).await.unwrap();
        let err = service.execute_agent(&created.agent_id, "  ").await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_set_status() {
        let service = service(true);
        let created = service.create_agent(request(&[])).await.unwrap();

        let record = service
            .set_agent_status(&created.agent_id, AgentStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(record.status, AgentStatus::Inactive);

        // Inactive agents still execute
        assert!(service.execute_agent(&created.agent_id, "hi").await.is_ok());

        let err = service
            .set_agent_status(&AgentId::from("missing"), AgentStatus::Active)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    /// Hands out each record once, then forgets it, like a delete racing the read
    #[derive(Default)]
    struct ReadOnceRepository {
        inner: InMemoryAgentRepository,
        read: Mutex<Vec<AgentId>>,
    }

    #[async_trait]
    impl AgentRepository for ReadOnceRepository {
        async fn insert(&self, record: AgentRecord) -> Result<(), RepositoryError> {
            self.inner.insert(record).await
        }

        async fn find_by_id(&self, id: &AgentId) -> Result<Option<AgentRecord>, RepositoryError> {
            let found = self.inner.find_by_id(id).await?;
            let first_read = {
                let mut read = self.read.lock();
                if read.contains(id) {
                    false
                } else {
                    read.push(id.clone());
                    true
                }
            };
            if !first_read {
                return Ok(None);
            }
            Ok(found)
        }

        async fn list_all(&self) -> Result<Vec<AgentRecord>, RepositoryError> {
            self.inner.list_all().await
        }

        async fn delete(&self, id: &AgentId) -> Result<bool, RepositoryError> {
            self.inner.delete(id).await
        }

        async fn update_status(&self, id: &AgentId, status: AgentStatus) -> Result<bool, RepositoryError> {
            self.inner.update_status(id, status).await
        }
    }

    fn read_once_service() -> AgentService {
        let config = NodeConfig::default();
        AgentService::new(
            AgentRegistry::new(Arc::new(ReadOnceRepository::default())),
            AgentExecutor::new(
                Arc::new(ToolCatalog::builtin()),
                Arc::new(ProviderRegistry::uniform("parrot", Arc::new(Parrot))),
                config.spec.executor.handle_settings(),
            ),
            AgentCodeGenerator::new(5).unwrap(),
            true,
        )
    }

    #[tokio::test]
    async fn test_rebuild_racing_delete_leaves_no_handle() {
        let service = read_once_service();
        let id = service
            .registry
            .save_agent(AgentDraft {
                name: "Racer".into(),
                description: "Deleted while rebuilding".into(),
                system_prompt: "You are a test agent.".into(),
                model: ModelId::Gpt4,
                tools: vec![],
                code: String::new(),
            })
            .await
            .unwrap();

        let err = service.execute_agent(&id, "hello").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!service.executor().is_agent_cached(&id));
    }

    #[tokio::test]
    async fn test_create_racing_delete_leaves_no_handle() {
        let service = read_once_service();
        // the create flow reads the record once, the re-check sees it gone
        let err = service.create_agent(request(&[])).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(service.executor().cached_count(), 0);
    }

    #[tokio::test]
    async fn test_generated_code_uses_configured_memory_window() {
        let mut config = NodeConfig::default();
        config.spec.executor.memory_last_messages = 8;
        let service =
            AgentService::with_providers(&config, ProviderRegistry::uniform("parrot", Arc::new(Parrot)))
                .unwrap();

        let created = service.create_agent(request(&[])).await.unwrap();
        let record = service.get_agent(&created.agent_id).await.unwrap();
        assert!(record.code.contains("lastMessages: 8"));
    }
}
