// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Swarm Configuration Manifest
//
// Kubernetes-style YAML document (apiVersion/kind/metadata/spec) describing:
// - LLM providers and the model aliases agents refer to as their "profile"
// - retry / fallback policy for inference calls
// - the swarm itself: execution strategy, consensus algorithm, per-agent
//   timeout, history window, per-partition quotas and the agent roster
// - logging

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "optiswarm.io/v1";
pub const KIND: &str = "SwarmConfig";

/// Top-level manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfigManifest {
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: SwarmConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmConfigSpec {
    #[serde(default)]
    pub llm_providers: Vec<LLMProviderConfig>,

    #[serde(default)]
    pub llm_selection: LLMSelection,

    #[serde(default)]
    pub swarm: SwarmSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMProviderConfig {
    /// Unique provider name (e.g. "ollama-local", "openai")
    pub name: String,

    /// "ollama", "openai", "anthropic" or "openai-compatible"
    #[serde(rename = "type")]
    pub provider_type: String,

    pub endpoint: String,

    /// Literal key or "env:VAR_NAME"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    pub models: Vec<ModelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Alias agents reference through their `profile`
    pub alias: String,

    /// Vendor model identifier
    pub model: String,

    #[serde(default)]
    pub capabilities: Vec<String>,

    #[serde(default = "default_context_window")]
    pub context_window: u32,

    /// 0.0 for local models
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMSelection {
    /// Provider tried once after the primary has exhausted its retries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay; doubled on every retry
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for LLMSelection {
    fn default() -> Self {
        Self {
            fallback_provider: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// Swarm execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmSettings {
    /// Pre-registered roster ("intent_classification", "data_analysis",
    /// "model_building", "solution_validation")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,

    /// Name from the built-in execution strategy table
    #[serde(default = "default_strategy")]
    pub strategy: String,

    #[serde(default = "default_algorithm")]
    pub default_algorithm: String,

    /// Upper bound on a single backend call
    #[serde(default = "default_agent_timeout", with = "humantime_serde")]
    pub agent_timeout: Duration,

    /// Number of task records kept per agent
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Requests per minute allowed against each partition
    #[serde(default)]
    pub partition_quotas: BTreeMap<String, u32>,

    /// Additional agents registered after the variant roster
    #[serde(default)]
    pub agents: Vec<RosterEntry>,
}

impl Default for SwarmSettings {
    fn default() -> Self {
        Self {
            variant: None,
            strategy: default_strategy(),
            default_algorithm: default_algorithm(),
            agent_timeout: default_agent_timeout(),
            history_window: default_history_window(),
            partition_quotas: BTreeMap::new(),
            agents: vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: String,
    pub specialization: String,
    pub role: String,
    pub partition: String,
    #[serde(default = "default_profile")]
    pub profile: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}

fn default_true() -> bool {
    true
}

fn default_context_window() -> u32 {
    8192
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    500
}

fn default_strategy() -> String {
    "batched".to_string()
}

fn default_algorithm() -> String {
    "confidence_weighted".to_string()
}

fn default_agent_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_history_window() -> usize {
    100
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SwarmConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "optiswarm".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: SwarmConfigSpec::default(),
        }
    }
}

impl SwarmConfigManifest {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Look for a manifest in, in order:
    /// 1. `OPTISWARM_CONFIG_PATH`
    /// 2. `./optiswarm.yaml`
    /// 3. `~/.optiswarm/config.yaml`
    /// 4. `/etc/optiswarm/config.yaml` (Unix) or `C:\ProgramData\Optiswarm\config.yaml`
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("OPTISWARM_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./optiswarm.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".optiswarm").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/optiswarm/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Optiswarm\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load from an explicit path (which must exist), else discovery, else defaults.
    /// Environment overrides are applied in every case.
    pub fn load_or_default(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = explicit {
            tracing::info!("Loading swarm configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading swarm configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::warn!("No swarm configuration found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// `OPTISWARM_STRATEGY` and `OPTISWARM_AGENT_TIMEOUT_SECS`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(strategy) = std::env::var("OPTISWARM_STRATEGY") {
            if !strategy.trim().is_empty() {
                tracing::info!("Environment override: OPTISWARM_STRATEGY={}", strategy);
                self.spec.swarm.strategy = strategy.trim().to_string();
            }
        }

        if let Ok(val) = std::env::var("OPTISWARM_AGENT_TIMEOUT_SECS") {
            match val.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    tracing::info!("Environment override: OPTISWARM_AGENT_TIMEOUT_SECS={}", secs);
                    self.spec.swarm.agent_timeout = Duration::from_secs(secs);
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for OPTISWARM_AGENT_TIMEOUT_SECS: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

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
                if model.alias.is_empty() {
                    anyhow::bail!("Model alias cannot be empty in provider: {}", provider.name);
                }
                if model.model.is_empty() {
                    anyhow::bail!("Model identifier cannot be empty for alias: {}", model.alias);
                }
            }
        }

        if let Some(fallback) = &self.spec.llm_selection.fallback_provider {
            if !self.spec.llm_providers.iter().any(|p| &p.name == fallback) {
                anyhow::bail!("Fallback provider '{}' not found in llm_providers", fallback);
            }
        }

        let swarm = &self.spec.swarm;
        if swarm.strategy.is_empty() {
            anyhow::bail!("spec.swarm.strategy cannot be empty");
        }
        if swarm.history_window == 0 {
            anyhow::bail!("spec.swarm.history_window must be at least 1");
        }
        if swarm.agent_timeout.is_zero() {
            anyhow::bail!("spec.swarm.agent_timeout must be non-zero");
        }
        for (partition, rpm) in &swarm.partition_quotas {
            if *rpm == 0 {
                anyhow::bail!("Quota for partition '{}' must be at least 1 request/minute", partition);
            }
        }

        let mut seen = HashSet::new();
        for entry in &swarm.agents {
            if entry.id.is_empty() {
                anyhow::bail!("Roster entry id cannot be empty");
            }
            if !seen.insert(entry.id.as_str()) {
                anyhow::bail!("Duplicate roster entry id: {}", entry.id);
            }
        }

        Ok(())
    }

    /// Logging section, falling back to defaults when absent.
    pub fn logging(&self) -> LoggingConfig {
        self.spec
            .observability
            .as_ref()
            .and_then(|o| o.logging.clone())
            .unwrap_or_default()
    }
}
