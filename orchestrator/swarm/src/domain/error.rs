// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::AgentId;
use thiserror::Error;

/// Configuration-time failures. Task execution never returns these: runtime
/// problems are reported inside `SwarmResult`.
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("Agent {0} is already registered in this swarm")]
    DuplicateAgent(AgentId),

    #[error("Agent {0} is not registered in this swarm")]
    UnknownAgent(AgentId),

    #[error("Unknown execution strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid execution strategy '{name}': {reason}")]
    InvalidStrategy { name: String, reason: String },

    #[error("Unknown consensus algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    #[error("Unknown swarm variant: {0}")]
    UnknownVariant(String),

    #[error("Invalid swarm configuration: {0}")]
    Config(String),
}
