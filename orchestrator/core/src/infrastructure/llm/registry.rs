// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Registry - Profile Alias Resolution
//
// An agent's "profile" is a model alias. The registry maps aliases to the
// provider serving them, retries transient failures with exponential
// backoff, and falls back to a secondary provider once retries run out.
// Rate-limit rejections are returned immediately: pacing against quotas is
// the executor's job, and retrying here would only burn more quota.

use crate::domain::config::{LLMProviderConfig, ModelConfig, SwarmConfigManifest};
use crate::domain::llm::{GenerationOptions, GenerationResponse, LLMError, LLMProvider};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::anthropic::AnthropicAdapter;
use super::ollama::OllamaAdapter;
use super::openai::OpenAIAdapter;

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LLMProvider>>,
    alias_map: HashMap<String, (String, ModelConfig)>, // alias -> (provider_name, model_config)
    fallback_provider: Option<String>,
    max_retries: u32,
    retry_delay: Duration,
}

impl ProviderRegistry {
    /// Empty registry; populate with [`ProviderRegistry::register`].
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            providers: HashMap::new(),
            alias_map: HashMap::new(),
            fallback_provider: None,
            max_retries,
            retry_delay,
        }
    }

    pub fn from_config(config: &SwarmConfigManifest) -> anyhow::Result<Self> {
        let selection = &config.spec.llm_selection;
        let mut registry = Self::new(
            selection.max_retries,
            Duration::from_millis(selection.retry_delay_ms),
        );

        info!("Initializing LLM provider registry");

        for provider_config in &config.spec.llm_providers {
            if !provider_config.enabled {
                info!("Provider '{}' disabled, skipping", provider_config.name);
                continue;
            }

            match Self::create_provider(provider_config) {
                Ok(provider) => {
                    registry.register(
                        provider_config.name.clone(),
                        provider,
                        provider_config.models.clone(),
                    );
                }
                Err(e) => {
                    warn!("Failed to initialize provider '{}': {}", provider_config.name, e);
                }
            }
        }

        if registry.providers.is_empty() {
            warn!("No LLM providers configured - every agent invocation will fail");
        }

        registry.fallback_provider = selection.fallback_provider.clone();
        Ok(registry)
    }

    /// Register a provider under `name` serving the given model aliases.
    pub fn register(
        &mut self,
        name: String,
        provider: Arc<dyn LLMProvider>,
        models: Vec<ModelConfig>,
    ) {
        for model in models {
            info!("Mapping profile '{}' -> {} ({})", model.alias, model.model, name);
            self.alias_map.insert(model.alias.clone(), (name.clone(), model));
        }
        self.providers.insert(name, provider);
    }

    pub fn with_fallback(mut self, provider_name: impl Into<String>) -> Self {
        self.fallback_provider = Some(provider_name.into());
        self
    }

    fn create_provider(config: &LLMProviderConfig) -> anyhow::Result<Arc<dyn LLMProvider>> {
        let api_key = Self::resolve_api_key(&config.api_key)?;
        let model = config
            .models
            .first()
            .ok_or_else(|| anyhow::anyhow!("No models configured"))?
            .model
            .clone();

        let provider: Arc<dyn LLMProvider> = match config.provider_type.as_str() {
            "openai" | "openai-compatible" => {
                Arc::new(OpenAIAdapter::new(config.endpoint.clone(), api_key, model))
            }
            "ollama" => Arc::new(OllamaAdapter::new(config.endpoint.clone(), model)),
            "anthropic" => Arc::new(AnthropicAdapter::new(config.endpoint.clone(), api_key, model)),
            other => anyhow::bail!("Unsupported provider type: {}", other),
        };

        Ok(provider)
    }

    /// Supports the "env:VAR_NAME" indirection.
    fn resolve_api_key(key: &Option<String>) -> anyhow::Result<String> {
        match key {
            Some(k) => match k.strip_prefix("env:") {
                Some(var_name) => std::env::var(var_name)
                    .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
                None => Ok(k.clone()),
            },
            None => Ok(String::new()),
        }
    }

    /// Generate with the provider serving `alias`.
    pub async fn generate(
        &self,
        alias: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError> {
        let (provider_name, _) = self
            .alias_map
            .get(alias)
            .ok_or_else(|| LLMError::ModelNotFound(format!("Profile '{}' not found", alias)))?;

        let provider = self.providers.get(provider_name).ok_or_else(|| {
            LLMError::Provider(format!("Provider '{}' not found", provider_name))
        })?;

        let attempts = self.max_retries.max(1);
        let mut last_error = None;

        for attempt in 0..attempts {
            match provider.generate(prompt, options).await {
                Ok(response) => {
                    debug!("Generation for '{}' succeeded on attempt {}", alias, attempt + 1);
                    return Ok(response);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    warn!(
                        "Generation for '{}' failed (attempt {}/{}): {}",
                        alias,
                        attempt + 1,
                        attempts,
                        e
                    );
                    last_error = Some(e);

                    if attempt + 1 < attempts {
                        let backoff = self.retry_delay.saturating_mul(2_u32.saturating_pow(attempt));
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        if let Some(fallback) = &self.fallback_provider {
            if fallback != provider_name {
                if let Some(fallback_provider) = self.providers.get(fallback) {
                    info!("Trying fallback provider '{}' for profile '{}'", fallback, alias);
                    return fallback_provider.generate(prompt, options).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LLMError::Provider("Unknown error".into())))
    }

    pub async fn health_check_all(&self) -> HashMap<String, Result<(), LLMError>> {
        let mut results = HashMap::new();
        for (name, provider) in &self.providers {
            results.insert(name.clone(), provider.health_check().await);
        }
        results
    }

    /// Cost per 1k tokens of the model behind `alias`, if known.
    pub fn cost_per_1k_tokens(&self, alias: &str) -> Option<f64> {
        self.alias_map.get(alias).map(|(_, m)| m.cost_per_1k_tokens)
    }

    pub fn available_aliases(&self) -> Vec<String> {
        self.alias_map.keys().cloned().collect()
    }

    pub fn has_alias(&self, alias: &str) -> bool {
        self.alias_map.contains_key(alias)
    }
}
