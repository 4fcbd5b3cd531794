// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle events emitted by a swarm while registering agents and
/// executing tasks. Identifiers are carried as strings so that observers
/// do not need the swarm crate's types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SwarmEvent {
    AgentRegistered {
        swarm_id: String,
        agent_id: String,
        specialization: String,
        partition: String,
        registered_at: DateTime<Utc>,
    },
    TaskStarted {
        swarm_id: String,
        task_id: String,
        task_type: String,
        agent_count: usize,
        strategy: String,
        started_at: DateTime<Utc>,
    },
    BatchDispatched {
        swarm_id: String,
        task_id: String,
        batch_index: usize,
        batch_size: usize,
        dispatched_at: DateTime<Utc>,
    },
    AgentCompleted {
        swarm_id: String,
        task_id: String,
        agent_id: String,
        confidence: f64,
        execution_time_ms: u64,
        completed_at: DateTime<Utc>,
    },
    AgentFailed {
        swarm_id: String,
        task_id: String,
        agent_id: String,
        error_kind: String,
        error: String,
        failed_at: DateTime<Utc>,
    },
    ConsensusReached {
        swarm_id: String,
        task_id: String,
        algorithm: String,
        confidence: f64,
        agreement_score: f64,
        participating_agents: usize,
        reached_at: DateTime<Utc>,
    },
    ConsensusFailed {
        swarm_id: String,
        task_id: String,
        algorithm: String,
        reason: String,
        failed_at: DateTime<Utc>,
    },
}

impl SwarmEvent {
    pub fn swarm_id(&self) -> &str {
        match self {
            SwarmEvent::AgentRegistered { swarm_id, .. }
            | SwarmEvent::TaskStarted { swarm_id, .. }
            | SwarmEvent::BatchDispatched { swarm_id, .. }
            | SwarmEvent::AgentCompleted { swarm_id, .. }
            | SwarmEvent::AgentFailed { swarm_id, .. }
            | SwarmEvent::ConsensusReached { swarm_id, .. }
            | SwarmEvent::ConsensusFailed { swarm_id, .. } => swarm_id,
        }
    }

    /// Task the event belongs to; `None` for registration events.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            SwarmEvent::AgentRegistered { .. } => None,
            SwarmEvent::TaskStarted { task_id, .. }
            | SwarmEvent::BatchDispatched { task_id, .. }
            | SwarmEvent::AgentCompleted { task_id, .. }
            | SwarmEvent::AgentFailed { task_id, .. }
            | SwarmEvent::ConsensusReached { task_id, .. }
            | SwarmEvent::ConsensusFailed { task_id, .. } => Some(task_id),
        }
    }
}
