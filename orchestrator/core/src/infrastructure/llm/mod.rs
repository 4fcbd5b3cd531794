// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Adapters
//
// Each adapter translates between `domain::llm` and one vendor HTTP API.
// Status handling is shared so that every vendor surfaces 429 as
// `LLMError::RateLimit`, which the swarm treats as a quota rejection.

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod registry;

pub use registry::ProviderRegistry;

use crate::domain::llm::LLMError;
use reqwest::StatusCode;

/// Translate a non-success HTTP status into the domain error.
pub(crate) fn error_for_status(status: StatusCode, body: String, model: &str) -> LLMError {
    match status.as_u16() {
        401 | 403 => LLMError::Authentication(body),
        429 => LLMError::RateLimit,
        404 => LLMError::ModelNotFound(model.to_string()),
        400 | 422 => LLMError::InvalidInput(body),
        _ => LLMError::Provider(format!("HTTP {}: {}", status, body)),
    }
}
