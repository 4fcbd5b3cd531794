// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Pure types for multi-agent execution. No network I/O.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `Agent`, `AgentId`, `AgentRole`, `AgentHistory` |
//! | [`roster`] | `SwarmId`, `SwarmRoster` (registry + peer graph) |
//! | [`task`] | `SwarmTask`, `TaskId` |
//! | [`result`] | `AgentResult`, `AgentOutcome`, `SwarmResult` |
//! | [`consensus`] | `ConsensusAlgorithm`, `ConsensusResult` |
//! | [`strategy`] | `ExecutionStrategy` and the built-in strategy table |
//! | [`inference`] | `InferenceBackend`, `InferenceError` |
//! | [`error`] | `SwarmError` |

pub mod agent;
pub mod consensus;
pub mod error;
pub mod inference;
pub mod result;
pub mod roster;
pub mod strategy;
pub mod task;

pub use agent::*;
pub use consensus::*;
pub use error::*;
pub use inference::*;
pub use result::*;
pub use roster::*;
pub use strategy::*;
pub use task::*;
