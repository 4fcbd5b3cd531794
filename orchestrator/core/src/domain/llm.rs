// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # LLM Provider Interface
//!
//! The swarm never talks to a vendor API directly. Every inference call goes
//! through [`LLMProvider`], and every vendor quirk (status codes, token
//! accounting, stop reasons) is translated at the adapter boundary in
//! `infrastructure::llm`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A text-completion backend.
///
/// Implementations must be safe to call concurrently: the swarm executor
/// issues one `generate` per agent in parallel against the same instance.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GenerationResponse, LLMError>;

    /// Cheap reachability/authentication probe.
    async fn health_check(&self) -> Result<(), LLMError>;
}

/// Sampling options passed through to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: Option<u32>,

    /// 0.0 = deterministic. Agents judging a task want this low.
    pub temperature: Option<f32>,

    pub stop_sequences: Option<Vec<String>>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: Some(2048),
            temperature: Some(0.2),
            stop_sequences: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub usage: TokenUsage,
    /// Adapter type that served the request (e.g. "openai", "ollama").
    pub provider: String,
    pub model: String,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
}

impl FinishReason {
    /// Map the vendor-specific stop string; unknown values count as `Stop`.
    pub fn from_vendor(reason: Option<&str>) -> Self {
        match reason {
            Some("length") | Some("max_tokens") => Self::Length,
            Some("content_filter") => Self::ContentFilter,
            _ => Self::Stop,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LLMError {
    /// Whether another attempt against the same provider can help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Provider(_))
    }
}
