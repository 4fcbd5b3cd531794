// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Roster
//!
//! - [`SwarmId`]: unique identifier (UUID newtype).
//! - [`SwarmRoster`]: the agent registry plus its peer graph.
//!
//! # Invariants
//!
//! - Agent ids are unique within a roster.
//! - The peer graph is complete: every agent's `peers` is the set of all
//!   other registered ids.
//! - Mutation (`add_agent`, `set_status`) needs `&mut self`; the owning
//!   [`Swarm`](crate::application::Swarm) is the only writer.

use crate::domain::agent::{Agent, AgentId, AgentStatus};
use crate::domain::error::SwarmError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwarmId(pub Uuid);

impl SwarmId {
    /// Generate a new random `SwarmId`.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SwarmId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SwarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SwarmRoster {
    agents: Vec<Agent>,
}

impl SwarmRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `agent` and rebuild the complete peer graph.
    ///
    /// A duplicate id is rejected and the existing registration is left
    /// untouched.
    pub fn add_agent(&mut self, agent: Agent) -> Result<(), SwarmError> {
        if self.contains(&agent.id) {
            return Err(SwarmError::DuplicateAgent(agent.id));
        }
        self.agents.push(agent);
        self.rebuild_peers();
        Ok(())
    }

    fn rebuild_peers(&mut self) {
        let ids: BTreeSet<AgentId> = self.agents.iter().map(|a| a.id.clone()).collect();
        for agent in &mut self.agents {
            agent.peers = ids.iter().filter(|id| **id != agent.id).cloned().collect();
        }
    }

    pub fn set_status(&mut self, id: &AgentId, status: AgentStatus) -> Result<(), SwarmError> {
        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or_else(|| SwarmError::UnknownAgent(id.clone()))?;
        agent.status = status;
        Ok(())
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.agents.iter().any(|a| a.id == *id)
    }

    pub fn get(&self, id: &AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == *id)
    }

    /// Agents in registration order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_active()).count()
    }

    pub fn partitions(&self) -> BTreeSet<String> {
        self.agents.iter().map(|a| a.partition.clone()).collect()
    }

    pub fn specializations(&self) -> BTreeSet<String> {
        self.agents.iter().map(|a| a.specialization.clone()).collect()
    }
}
