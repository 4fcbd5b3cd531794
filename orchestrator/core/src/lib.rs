// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `optiswarm-core`: Shared Plumbing for the Swarm Orchestrator
//!
//! Everything the swarm engine needs from the outside world, behind domain
//! interfaces:
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain::llm`] | Domain | `LLMProvider` trait, generation options/response, `LLMError` |
//! | [`domain::config`] | Domain | `SwarmConfigManifest` YAML schema, discovery, validation |
//! | [`domain::events`] | Domain | `SwarmEvent` lifecycle events |
//! | [`infrastructure::llm`] | Infrastructure | OpenAI / Ollama / Anthropic adapters, `ProviderRegistry` |
//! | [`infrastructure::event_bus`] | Infrastructure | tokio broadcast `EventBus` |
//! | [`infrastructure::telemetry`] | Infrastructure | `tracing-subscriber` initialisation |

pub mod domain;
pub mod infrastructure;

pub use domain::*;
