// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod llm_backend;

pub use llm_backend::{extract_json, LlmInferenceBackend};
