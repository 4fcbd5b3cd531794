// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `optiswarm-swarm`: Multi-Agent Swarm Execution and Consensus
//!
//! Fans one logical request out to N specialized agents, runs them under a
//! rate-aware execution strategy, and reduces their judgments to a single
//! agreed answer.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Agent`, `SwarmRoster`, `SwarmTask`, `AgentResult`, `ConsensusResult`, `SwarmResult`, `ExecutionStrategy`, `InferenceBackend` |
//! | [`application`] | Application | `Swarm`, `SwarmBuilder`, `ParallelExecutor`, `ConsensusEngine`, prompt builders, `SwarmVariant` |
//! | [`infrastructure`] | Infrastructure | `LlmInferenceBackend` over the core provider registry |
//!
//! ## Flow
//!
//! ```text
//! Swarm::execute_swarm_task
//!   -> ParallelExecutor::execute_agents_parallel   (one AgentResult per agent, always)
//!   -> ConsensusEngine::aggregate                  (null value when nobody succeeded)
//!   -> SwarmResult
//! ```
//!
//! Failure is data: a caller always receives a `SwarmResult`. The only hard
//! errors are configuration errors while building the swarm, such as
//! registering the same agent id twice.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::*;
pub use domain::*;
