// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Inference Backend Interface
//!
//! The black box each agent calls. Implementations must be safe to call
//! concurrently and must report failures as [`InferenceError`], never as a
//! partially filled success.

use crate::domain::agent::AgentProfile;
use crate::domain::result::AgentErrorKind;
use async_trait::async_trait;
use optiswarm_core::domain::llm::LLMError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn invoke(
        &self,
        prompt: &str,
        context: &BTreeMap<String, Value>,
        profile: &AgentProfile,
    ) -> Result<InferenceResponse, InferenceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub result: Map<String, Value>,
    /// Self-reported confidence, if the backend supplied one.
    pub confidence: Option<f64>,
    pub usage: Option<InferenceUsage>,
}

impl InferenceResponse {
    pub fn new(result: Map<String, Value>) -> Self {
        Self {
            result,
            confidence: None,
            usage: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_usage(mut self, usage: InferenceUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InferenceUsage {
    pub tokens: u32,
    pub cost: f64,
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Invocation failed: {0}")]
    Invocation(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Cancelled")]
    Cancelled,
}

impl InferenceError {
    pub fn kind(&self) -> AgentErrorKind {
        match self {
            InferenceError::Invocation(_) => AgentErrorKind::Invocation,
            InferenceError::QuotaExceeded(_) => AgentErrorKind::QuotaExceeded,
            InferenceError::Timeout(_) => AgentErrorKind::Timeout,
            InferenceError::Malformed(_) => AgentErrorKind::MalformedResponse,
            InferenceError::Cancelled => AgentErrorKind::Cancelled,
        }
    }
}

impl From<LLMError> for InferenceError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::RateLimit => InferenceError::QuotaExceeded(err.to_string()),
            other => InferenceError::Invocation(other.to_string()),
        }
    }
}
