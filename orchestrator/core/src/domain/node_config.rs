// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

// Node Configuration Types
//
// Defines the configuration schema for an AgentForge node, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server binding
// - LLM provider configuration and model mapping for the fixed model set
// - Executor behaviour (tool steps, conversation memory, cache misses)
// - Logging and metrics settings

use crate::domain::agent::ModelId;
use crate::domain::handle::HandleSettings;
use crate::domain::llm::GenerationOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "agentforge.dev/v1";
pub const KIND: &str = "NodeConfig";
pub const CONFIG_PATH_ENV: &str = "AGENTFORGE_CONFIG_PATH";

// Upper bounds enforced by `validate`
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;
pub const RETRY_DELAY_LIMIT_MS: u64 = 60_000;
pub const MAX_TOOL_STEPS_LIMIT: u32 = 50;
pub const MEMORY_MESSAGES_LIMIT: usize = 1_000;

/// Top-level Kubernetes-style node configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfigManifest {
    /// API version (must be "agentforge.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "NodeConfig")
    pub kind: String,

    /// Node metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Node configuration specification
    #[serde(default)]
    pub spec: NodeConfigSpec,
}

pub type NodeConfig = NodeConfigManifest;

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    /// Optional: Configuration version for tracking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Optional: Labels for categorization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

/// Node configuration specification (content under spec:)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfigSpec {
    /// HTTP API binding
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configurations
    #[serde(default)]
    pub llm_providers: Vec<LLMProviderConfig>,

    /// Provider selection and failure policy
    #[serde(default)]
    pub llm_selection: LLMSelection,

    /// Agent executor behaviour
    #[serde(default)]
    pub executor: ExecutorConfig,

    /// Observability configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Unique provider name (e.g., "openai", "ollama-local")
    pub name: String,

    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: String, // "openai", "openai-compatible", "ollama"

    /// API endpoint URL
    pub endpoint: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Whether this provider is active
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Agent models served by this provider
    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Agent-facing model id ("gpt-4.1-nano", "gpt-4", "gpt-3.5-turbo")
    pub alias: String,

    /// Actual model identifier for the provider API
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMSelection {
    /// Fallback provider if the primary fails on its last attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<String>,

    /// Attempts per call against the primary provider (1 = no retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds (doubles each attempt)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum model round-trips spent answering tool calls per execution
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: u32,

    /// Conversation messages each handle replays on the next call
    #[serde(default = "default_memory_last_messages")]
    pub memory_last_messages: usize,

    /// Rebuild a handle from the registry when the cache has lost it
    #[serde(default = "default_true")]
    pub rebuild_on_miss: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ExecutorConfig {
    pub fn handle_settings(&self) -> HandleSettings {
        let defaults = GenerationOptions::default();
        HandleSettings {
            options: GenerationOptions {
                max_tokens: self.max_tokens.or(defaults.max_tokens),
                temperature: self.temperature.or(defaults.temperature),
                stop_sequences: None,
            },
            max_tool_steps: self.max_tool_steps,
            memory_last_messages: self.memory_last_messages,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    /// Metrics configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics exposition
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_max_tool_steps() -> u32 {
    5
}

fn default_memory_last_messages() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for LLMSelection {
    fn default() -> Self {
        Self {
            fallback_provider: None,
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_tool_steps: default_max_tool_steps(),
            memory_last_messages: default_memory_last_messages(),
            rebuild_on_miss: true,
            max_tokens: None,
            temperature: None,
        }
    }
}

impl Default for NodeConfigSpec {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm_providers: vec![LLMProviderConfig {
                name: "openai".to_string(),
                provider_type: "openai".to_string(),
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: Some("env:OPENAI_API_KEY".to_string()),
                enabled: true,
                models: ModelId::ALL
                    .iter()
                    .map(|m| ModelConfig {
                        alias: m.as_str().to_string(),
                        model: m.as_str().to_string(),
                    })
                    .collect(),
            }],
            llm_selection: LLMSelection::default(),
            executor: ExecutorConfig::default(),
            observability: None,
        }
    }
}

impl Default for NodeConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "agentforge-node".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: NodeConfigSpec::default(),
        }
    }
}

impl NodeConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Candidate locations in precedence order, after an explicit `--config`
    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(path));
        }
        paths.push(PathBuf::from("./agentforge-config.yaml"));
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".agentforge").join("config.yaml"));
        }
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/agentforge/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\AgentForge\\config.yaml"));
        paths
    }

    /// Discover configuration file using precedence order
    /// 1. AGENTFORGE_CONFIG_PATH environment variable
    /// 2. ./agentforge-config.yaml (working directory)
    /// 3. ~/.agentforge/config.yaml (user home)
    /// 4. /etc/agentforge/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path (fail if missing/invalid)
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AGENTFORGE_MAX_TOOL_STEPS") {
            match val.parse::<u32>() {
                Ok(steps) => {
                    tracing::info!("Environment override: AGENTFORGE_MAX_TOOL_STEPS={}", steps);
                    self.spec.executor.max_tool_steps = steps;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for AGENTFORGE_MAX_TOOL_STEPS: '{}'. Expected a number. Ignoring.",
                    val
                ),
            }
        }

        if let Ok(val) = std::env::var("AGENTFORGE_REBUILD_ON_MISS") {
            match parse_flag(&val) {
                Some(flag) => {
                    tracing::info!("Environment override: AGENTFORGE_REBUILD_ON_MISS={}", flag);
                    self.spec.executor.rebuild_on_miss = flag;
                }
                None => tracing::warn!(
                    "Invalid value for AGENTFORGE_REBUILD_ON_MISS: '{}'. Expected true/false. Ignoring.",
                    val
                ),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        for provider in &self.spec.llm_providers {
            if provider.name.is_empty() {
                anyhow::bail!("LLM provider name cannot be empty");
            }

            if provider.endpoint.is_empty() {
                anyhow::bail!("LLM provider endpoint cannot be empty for: {}", provider.name);
            }

            if provider.models.is_empty() {
                anyhow::bail!("LLM provider must have at least one model: {}", provider.name);
            }

            for model in &provider.models {
                if let Err(e) = model.alias.parse::<ModelId>() {
                    anyhow::bail!("{} (provider: {})", e, provider.name);
                }

                if model.model.is_empty() {
                    anyhow::bail!("Model identifier cannot be empty for alias: {}", model.alias);
                }
            }
        }

        if let Some(fallback_provider) = &self.spec.llm_selection.fallback_provider {
            if !self.spec.llm_providers.iter().any(|p| &p.name == fallback_provider) {
                anyhow::bail!("Fallback provider '{}' not found in llm_providers", fallback_provider);
            }
        }

        let selection = &self.spec.llm_selection;
        if selection.max_attempts == 0 || selection.max_attempts > MAX_ATTEMPTS_LIMIT {
            anyhow::bail!(
                "llm_selection.max_attempts must be between 1 and {}",
                MAX_ATTEMPTS_LIMIT
            );
        }

        if selection.retry_delay_ms > RETRY_DELAY_LIMIT_MS {
            anyhow::bail!(
                "llm_selection.retry_delay_ms cannot exceed {}",
                RETRY_DELAY_LIMIT_MS
            );
        }

        let executor = &self.spec.executor;
        if executor.max_tool_steps > MAX_TOOL_STEPS_LIMIT {
            anyhow::bail!("executor.max_tool_steps cannot exceed {}", MAX_TOOL_STEPS_LIMIT);
        }

        if executor.memory_last_messages > MEMORY_MESSAGES_LIMIT {
            anyhow::bail!(
                "executor.memory_last_messages cannot exceed {}",
                MEMORY_MESSAGES_LIMIT
            );
        }

        Ok(())
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = NodeConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert_eq!(manifest.spec.llm_providers.len(), 1);
        assert_eq!(manifest.spec.llm_providers[0].models.len(), 3);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
apiVersion: agentforge.dev/v1
kind: NodeConfig
metadata:
  name: test-node
spec:
  server:
    port: 9100
  llm_providers:
    - name: local
      type: ollama
      endpoint: http://localhost:11434
      models:
        - alias: gpt-4
          model: llama3.2
  executor:
    max_tool_steps: 2
"#;
        let config = NodeConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(config.spec.server.port, 9100);
        assert_eq!(config.spec.server.bind_address, "127.0.0.1");
        assert_eq!(config.spec.llm_providers[0].provider_type, "ollama");
        assert_eq!(config.spec.executor.max_tool_steps, 2);
        assert_eq!(config.spec.executor.memory_last_messages, 5);
        assert!(config.spec.executor.rebuild_on_miss);
        assert_eq!(config.spec.llm_selection.max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut manifest = NodeConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "WrongKind".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.llm_providers[0].models[0].alias = "gpt-9".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.llm_providers[0].models[0].alias = "gpt-4".to_string();

        manifest.spec.llm_selection.fallback_provider = Some("nope".to_string());
        assert!(manifest.validate().is_err());
        manifest.spec.llm_selection.fallback_provider = None;

        manifest.spec.llm_selection.max_attempts = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.llm_selection.max_attempts = 1;
    }

    #[test]
    fn test_validation_upper_bounds() {
        let mut manifest = NodeConfigManifest::default();

        manifest.spec.llm_selection.max_attempts = MAX_ATTEMPTS_LIMIT;
        assert!(manifest.validate().is_ok());
        manifest.spec.llm_selection.max_attempts = 65;
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
        manifest.spec.llm_selection.max_attempts = 1;

        manifest.spec.llm_selection.retry_delay_ms = u64::MAX;
        assert!(manifest.validate().is_err());
        manifest.spec.llm_selection.retry_delay_ms = 1000;

        manifest.spec.executor.max_tool_steps = MAX_TOOL_STEPS_LIMIT + 1;
        assert!(manifest.validate().is_err());
        manifest.spec.executor.max_tool_steps = 5;

        manifest.spec.executor.memory_last_messages = usize::MAX;
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("memory_last_messages"));
    }

    #[test]
    fn test_handle_settings_defaults() {
        let settings = ExecutorConfig::default().handle_settings();
        assert_eq!(settings.max_tool_steps, 5);
        assert_eq!(settings.memory_last_messages, 5);
        assert_eq!(settings.options.max_tokens, Some(4096));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        NodeConfigManifest::default().to_yaml_file(&path).unwrap();

        let loaded = NodeConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "agentforge-node");
        assert_eq!(loaded.spec.llm_providers[0].name, "openai");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
