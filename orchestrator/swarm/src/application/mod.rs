// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: the swarm aggregate and the services it is built from.

pub mod consensus_engine;
pub mod executor;
pub mod prompt;
pub mod quota;
pub mod swarm;
pub mod variants;

pub use consensus_engine::{ConsensusEngine, VoteKey};
pub use executor::{
    ExecutionObserver, ExecutorSettings, NoopObserver, ParallelExecutor, DEFAULT_CONFIDENCE,
    MAX_POOL,
};
pub use prompt::{AgentPromptBuilder, DefaultPromptBuilder};
pub use swarm::{AgentSpec, Swarm, SwarmBuilder, SwarmStatus, DEFAULT_HISTORY_WINDOW};
pub use variants::{RosterSlot, SwarmVariant, VariantPromptBuilder};
