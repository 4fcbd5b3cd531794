// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Inference Backend
//
// Implements `InferenceBackend` on top of the core provider registry. The
// agent profile is the model alias. Completions must contain one JSON
// object, either bare or inside a ``` fence; a numeric "confidence" field is
// lifted out as the agent's self-reported confidence.
//
// Task context is not appended to the prompt unless asked for: the default
// prompt builders already render it.

use crate::domain::agent::AgentProfile;
use crate::domain::inference::{
    InferenceBackend, InferenceError, InferenceResponse, InferenceUsage,
};
use async_trait::async_trait;
use optiswarm_core::domain::llm::GenerationOptions;
use optiswarm_core::infrastructure::llm::ProviderRegistry;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct LlmInferenceBackend {
    registry: Arc<ProviderRegistry>,
    options: GenerationOptions,
    append_context: bool,
}

impl LlmInferenceBackend {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            options: GenerationOptions::default(),
            append_context: false,
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Append the task context to every prompt, for prompt builders that
    /// do not render it themselves.
    pub fn with_appended_context(mut self) -> Self {
        self.append_context = true;
        self
    }

    fn render_prompt(&self, prompt: &str, context: &BTreeMap<String, Value>) -> String {
        if !self.append_context || context.is_empty() {
            return prompt.to_string();
        }
        let context = serde_json::to_string_pretty(context).unwrap_or_default();
        format!("{}\n\nAdditional context:\n{}", prompt, context)
    }
}

#[async_trait]
impl InferenceBackend for LlmInferenceBackend {
    async fn invoke(
        &self,
        prompt: &str,
        context: &BTreeMap<String, Value>,
        profile: &AgentProfile,
    ) -> Result<InferenceResponse, InferenceError> {
        let prompt = self.render_prompt(prompt, context);
        let response = self
            .registry
            .generate(profile.as_str(), &prompt, &self.options)
            .await?;

        debug!(
            profile = %profile,
            provider = %response.provider,
            model = %response.model,
            tokens = response.usage.total_tokens,
            "Completion received"
        );

        let json = extract_json(&response.text).ok_or_else(|| {
            InferenceError::Malformed("Completion contains no JSON object".to_string())
        })?;
        let parsed: Value = serde_json::from_str(json)
            .map_err(|e| InferenceError::Malformed(format!("Invalid JSON: {}", e)))?;
        let Value::Object(result) = parsed else {
            return Err(InferenceError::Malformed(
                "Completion JSON is not an object".to_string(),
            ));
        };

        let confidence = result.get("confidence").and_then(Value::as_f64);
        let tokens = response.usage.total_tokens;
        let cost = self
            .registry
            .cost_per_1k_tokens(profile.as_str())
            .map(|per_1k| per_1k * f64::from(tokens) / 1000.0)
            .unwrap_or(0.0);

        let mut inference =
            InferenceResponse::new(result).with_usage(InferenceUsage { tokens, cost });
        if let Some(confidence) = confidence {
            inference = inference.with_confidence(confidence);
        }
        Ok(inference)
    }
}

/// Locate the JSON object in a completion: a ```json fence, then any fence,
/// then the outermost braces.
pub fn extract_json(text: &str) -> Option<&str> {
    for marker in ["```json", "```"] {
        if let Some(start) = text.find(marker) {
            let content_start = start + marker.len();
            if let Some(end_offset) = text[content_start..].find("```") {
                let fenced = text[content_start..content_start + end_offset].trim();
                if !fenced.is_empty() {
                    return Some(fenced);
                }
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
