// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Model Resolution and Provider Management
//
// Maps the fixed agent model ids onto configured providers. Each model id
// resolves to a routed provider that applies the attempt/backoff policy and
// the optional fallback provider.

use crate::domain::agent::ModelId;
use crate::domain::llm::{ChatRequest, ChatResponse, LLMError, LLMProvider};
use crate::domain::node_config::{LLMProviderConfig, LLMSelection, NodeConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;

/// Adapter for one (provider, model) pair
#[derive(Clone)]
struct Route {
    provider_name: String,
    provider: Arc<dyn LLMProvider>,
}

/// Registry for managing LLM providers and resolving agent model ids
pub struct ProviderRegistry {
    /// model id -> primary route
    routes: HashMap<ModelId, Route>,
    /// provider name -> (model id -> adapter); used for fallback and health checks
    by_provider: HashMap<String, Vec<(ModelId, Arc<dyn LLMProvider>)>>,
    fallback_provider: Option<String>,
    max_attempts: u32,
    retry_delay_ms: u64,
}

impl ProviderRegistry {
    /// Create provider registry from node configuration
    pub fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        let mut registry = Self::empty(&config.spec.llm_selection);

        info!("Initializing LLM provider registry");

        for provider_config in &config.spec.llm_providers {
            if !provider_config.enabled {
                info!("Provider '{}' disabled, skipping", provider_config.name);
                continue;
            }

            info!("Initializing provider: {}", provider_config.name);

            match Self::create_routes(provider_config) {
                Ok(routes) => {
                    for (model_id, provider) in routes {
                        registry.register(&provider_config.name, model_id, provider);
                    }
                }
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
                    // Continue with other providers
                }
            }
        }

        if registry.routes.is_empty() {
            warn!("No LLM providers configured - agent executions will fail");
        }

        Ok(registry)
    }

    /// Registry with no providers and the given selection policy
    pub fn empty(selection: &LLMSelection) -> Self {
        Self {
            routes: HashMap::new(),
            by_provider: HashMap::new(),
            fallback_provider: selection.fallback_provider.clone(),
            max_attempts: selection.max_attempts.max(1),
            retry_delay_ms: selection.retry_delay_ms,
        }
    }

    /// Serve every model id from one provider
    pub fn uniform(name: &str, provider: Arc<dyn LLMProvider>) -> Self {
        let mut registry = Self::empty(&LLMSelection::default());
        for model_id in ModelId::ALL {
            registry.register(name, model_id, provider.clone());
        }
        registry
    }

    /// Register `provider` for `model_id`. The first provider registered for a
    /// model id stays its primary.
    pub fn register(&mut self, provider_name: &str, model_id: ModelId, provider: Arc<dyn LLMProvider>) {
        debug!("Mapping model '{}' -> {}", model_id, provider_name);
        self.routes.entry(model_id).or_insert_with(|| Route {
            provider_name: provider_name.to_string(),
            provider: provider.clone(),
        });
        self.by_provider
            .entry(provider_name.to_string())
            .or_default()
            .push((model_id, provider));
    }

    /// Build one adapter per configured model of a provider
    fn create_routes(
        config: &LLMProviderConfig,
    ) -> anyhow::Result<Vec<(ModelId, Arc<dyn LLMProvider>)>> {
        let api_key = Self::resolve_api_key(&config.api_key)?;

        let mut routes = Vec::with_capacity(config.models.len());
        for model_config in &config.models {
            let model_id: ModelId = model_config
                .alias
                .parse()
                .map_err(|e| anyhow::anyhow!("{}", e))?;

            let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
                // OpenAI-compatible APIs (LM Studio, vLLM, etc.)
                "openai" | "openai-compatible" => Arc::new(OpenAIAdapter::new(
                    config.endpoint.clone(),
                    api_key.clone(),
                    model_config.model.clone(),
                )),
                "ollama" => Arc::new(OllamaAdapter::new(
                    config.endpoint.clone(),
                    model_config.model.clone(),
                )),
                _ => anyhow::bail!("Unsupported provider type: {}", config.provider_type),
            };

            info!(
                "Mapping model '{}' -> {} ({})",
                model_id, model_config.model, config.name
            );
            routes.push((model_id, provider));
        }

        Ok(routes)
    }

    /// Resolve API key from config (supports "env:VAR_NAME" syntax)
    pub fn resolve_api_key(key: &Option<String>) -> anyhow::Result<String> {
        match key {
            Some(k) => match k.strip_prefix("env:") {
                Some(var_name) => std::env::var(var_name).map_err(|_| {
                    anyhow::anyhow!("Environment variable not set: {}", var_name)
                }),
                None => Ok(k.clone()),
            },
            None => Ok(String::new()), // For local providers without auth
        }
    }

    /// Provider for an agent model. Never fails: a model with no route yields a
    /// provider whose calls fail with `ModelNotFound`.
    pub fn provider_for(&self, model_id: ModelId) -> Arc<dyn LLMProvider> {
        let primary = self.routes.get(&model_id).cloned();

        let fallback = self.fallback_provider.as_ref().and_then(|name| {
            if primary.as_ref().is_some_and(|r| &r.provider_name == name) {
                return None;
            }
            let models = self.by_provider.get(name)?;
            models
                .iter()
                .find(|(id, _)| *id == model_id)
                .or_else(|| models.first())
                .map(|(_, provider)| Route {
                    provider_name: name.clone(),
                    provider: provider.clone(),
                })
        });

        Arc::new(RoutedProvider {
            model_id,
            primary,
            fallback,
            max_attempts: self.max_attempts,
            retry_delay_ms: self.retry_delay_ms,
        })
    }

    /// Check health of all providers
    pub async fn health_check_all(&self) -> HashMap<String, Result<(), LLMError>> {
        let checks = self.by_provider.iter().filter_map(|(name, models)| {
            let (_, provider) = models.first()?;
            info!("Health checking provider: {}", name);
            let provider = provider.clone();
            Some(async move { (name.clone(), provider.health_check().await) })
        });

        futures::future::join_all(checks).await.into_iter().collect()
    }

    /// Model ids with a configured provider, in canonical order
    pub fn available_models(&self) -> Vec<ModelId> {
        ModelId::ALL
            .into_iter()
            .filter(|id| self.routes.contains_key(id))
            .collect()
    }

    pub fn has_model(&self, model_id: ModelId) -> bool {
        self.routes.contains_key(&model_id)
    }
}

/// Provider bound to one agent model id.
/// Retries the primary with exponential backoff, then tries the fallback once.
struct RoutedProvider {
    model_id: ModelId,
    primary: Option<Route>,
    fallback: Option<Route>,
    max_attempts: u32,
    retry_delay_ms: u64,
}

#[async_trait]
impl LLMProvider for RoutedProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LLMError> {
        let Some(primary) = &self.primary else {
            return match &self.fallback {
                Some(fallback) => fallback.provider.chat(request).await,
                None => Err(LLMError::ModelNotFound(format!(
                    "No provider configured for model '{}'",
                    self.model_id
                ))),
            };
        };

        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            match primary.provider.chat(request).await {
                Ok(response) => {
                    debug!(
                        "Chat via '{}' succeeded on attempt {}",
                        primary.provider_name,
                        attempt + 1
                    );
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        "Chat via '{}' failed (attempt {}/{}): {}",
                        primary.provider_name,
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                    last_error = Some(e);

                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(tokio::time::Duration::from_millis(backoff_delay_ms(
                            self.retry_delay_ms,
                            attempt,
                        )))
                        .await;
                    }
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            info!("Trying fallback provider: {}", fallback.provider_name);
            return fallback.provider.chat(request).await;
        }

        Err(last_error.unwrap_or_else(|| LLMError::Provider("Unknown error".into())))
    }

    async fn health_check(&self) -> Result<(), LLMError> {
        match &self.primary {
            Some(route) => route.provider.health_check().await,
            None => Err(LLMError::ModelNotFound(self.model_id.to_string())),
        }
    }
}

/// Upper bound on a single backoff sleep
const MAX_BACKOFF_MS: u64 = 60_000;

/// Exponential backoff before retry `attempt + 1`, capped at [`MAX_BACKOFF_MS`]
fn backoff_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    2_u64
        .checked_pow(attempt)
        .map_or(u64::MAX, |factor| base_ms.saturating_mul(factor))
        .min(MAX_BACKOFF_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{
        ChatMessage, FinishReason, GenerationOptions, TokenUsage,
    };
    use crate::domain::node_config::{LLMProviderConfig, ModelConfig, NodeConfigManifest};
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails a fixed number of times, then answers with its name
    struct FlakyProvider {
        name: &'static str,
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyProvider {
        fn new(name: &'static str, failures: u32) -> Arc<Self> {
            Arc::new(Self {
                name,
                failures,
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, LLMError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(LLMError::Provider(format!("{} down", self.name)));
            }
            Ok(ChatResponse {
                text: self.name.to_string(),
                tool_calls: vec![],
                usage: TokenUsage::default(),
                provider: self.name.to_string(),
                model: "m".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }

        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: "gpt-4".into(),
            messages: vec![ChatMessage::user("hi")],
            tools: vec![],
            options: GenerationOptions::default(),
        }
    }

    fn selection(fallback: Option<&str>, max_attempts: u32) -> LLMSelection {
        LLMSelection {
            fallback_provider: fallback.map(String::from),
            max_attempts,
            retry_delay_ms: 1,
        }
    }

    #[test]
    fn test_registry_from_config() {
        let mut config = NodeConfigManifest::default();
        config.spec.llm_providers = vec![LLMProviderConfig {
            name: "local".to_string(),
            provider_type: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            api_key: None,
            enabled: true,
            models: vec![ModelConfig {
                alias: "gpt-4".to_string(),
                model: "llama3.2".to_string(),
            }],
        }];

        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert!(registry.has_model(ModelId::Gpt4));
        assert_eq!(registry.available_models(), vec![ModelId::Gpt4]);
    }

    #[test]
    fn test_missing_env_key_skips_provider() {
        let mut config = NodeConfigManifest::default();
        config.spec.llm_providers[0].api_key =
            Some("env:AGENTFORGE_TEST_KEY_THAT_IS_NOT_SET".to_string());

        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert!(registry.available_models().is_empty());
    }

    #[test]
    fn test_resolve_literal_api_key() {
        let key = ProviderRegistry::resolve_api_key(&Some("sk-literal".to_string())).unwrap();
        assert_eq!(key, "sk-literal");
        assert_eq!(ProviderRegistry::resolve_api_key(&None).unwrap(), "");
    }

    #[tokio::test]
    async fn test_unmapped_model_fails_at_call_time() {
        let registry = ProviderRegistry::empty(&LLMSelection::default());
        let provider = registry.provider_for(ModelId::Gpt35Turbo);
        let err = provider.chat(&request()).await.unwrap_err();
        assert!(matches!(err, LLMError::ModelNotFound(_)));
    }

    #[tokio::test]
    async fn test_single_attempt_by_default() {
        let primary = FlakyProvider::new("primary", 1);
        let registry = ProviderRegistry::uniform("primary", primary.clone());

        let err = registry.provider_for(ModelId::Gpt4).chat(&request()).await;
        assert!(err.is_err());
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let primary = FlakyProvider::new("primary", 2);
        let mut registry = ProviderRegistry::empty(&selection(None, 3));
        registry.register("primary", ModelId::Gpt4, primary.clone());

        let response = registry.provider_for(ModelId::Gpt4).chat(&request()).await.unwrap();
        assert_eq!(response.text, "primary");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fallback_after_last_attempt() {
        let primary = FlakyProvider::new("primary", 10);
        let backup = FlakyProvider::new("backup", 0);
        let mut registry = ProviderRegistry::empty(&selection(Some("backup"), 2));
        registry.register("primary", ModelId::Gpt4, primary.clone());
        registry.register("backup", ModelId::Gpt35Turbo, backup.clone());

        let response = registry.provider_for(ModelId::Gpt4).chat(&request()).await.unwrap();
        assert_eq!(response.text, "backup");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay_ms(1000, 0), 1000);
        assert_eq!(backoff_delay_ms(1000, 2), 4000);
        assert_eq!(backoff_delay_ms(1000, 10), MAX_BACKOFF_MS);
        assert_eq!(backoff_delay_ms(u64::MAX, 1), MAX_BACKOFF_MS);
        assert_eq!(backoff_delay_ms(1, 64), MAX_BACKOFF_MS);
    }
}
