// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Domain Model
//!
//! An [`Agent`] binds a specialization, a functional [`AgentRole`], a resource
//! partition (typically a region) and an inference [`AgentProfile`].
//!
//! Agents are created by [`SwarmRoster::add_agent`](crate::domain::SwarmRoster::add_agent)
//! and mutated only by the owning swarm. The per-agent [`AgentHistory`] sits
//! behind its own lock so that recording one agent's outcome never contends
//! with another's.

use crate::domain::error::SwarmError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Unique identifier of an agent within one swarm.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Functional role an agent plays inside a swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Classifier,
    Analyzer,
    Modeler,
    Optimizer,
    Validator,
    Coordinator,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Classifier => "classifier",
            AgentRole::Analyzer => "analyzer",
            AgentRole::Modeler => "modeler",
            AgentRole::Optimizer => "optimizer",
            AgentRole::Validator => "validator",
            AgentRole::Coordinator => "coordinator",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classifier" => Ok(AgentRole::Classifier),
            "analyzer" | "analyst" => Ok(AgentRole::Analyzer),
            "modeler" => Ok(AgentRole::Modeler),
            "optimizer" => Ok(AgentRole::Optimizer),
            "validator" => Ok(AgentRole::Validator),
            "coordinator" => Ok(AgentRole::Coordinator),
            other => Err(SwarmError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Active,
    Disabled,
}

/// Opaque handle passed to the inference backend to pick a model.
///
/// With the LLM-backed backend this is a model alias from the provider
/// registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentProfile(pub String);

impl AgentProfile {
    pub fn new(profile: impl Into<String>) -> Self {
        Self(profile.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self("default".to_string())
    }
}

impl fmt::Display for AgentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One past task outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub success: bool,
    pub confidence: f64,
    pub execution_time_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

/// Rolling window of task outcomes, oldest first.
#[derive(Debug, Clone)]
pub struct AgentHistory {
    window: usize,
    records: VecDeque<TaskRecord>,
    total_tasks: u64,
}

impl AgentHistory {
    /// A zero window is treated as one.
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            records: VecDeque::new(),
            total_tasks: 0,
        }
    }

    pub fn record(&mut self, record: TaskRecord) {
        if self.records.len() == self.window {
            self.records.pop_front();
        }
        self.records.push_back(record);
        self.total_tasks += 1;
    }

    /// Mean confidence over the retained window; 0.0 when empty.
    pub fn average_confidence(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().map(|r| r.confidence).sum::<f64>() / self.records.len() as f64
    }

    pub fn average_execution_time_ms(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().map(|r| r.execution_time_ms as f64).sum::<f64>()
            / self.records.len() as f64
    }

    pub fn success_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        self.records.iter().filter(|r| r.success).count() as f64 / self.records.len() as f64
    }

    /// Tasks recorded over the agent's lifetime, including evicted ones.
    pub fn total_tasks(&self) -> u64 {
        self.total_tasks
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter()
    }
}

/// A specialized worker inside a swarm.
///
/// Cloning an `Agent` yields a handle that shares the same history, so the
/// executor can work on snapshots while outcomes still land on the
/// registered agent.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub specialization: String,
    pub role: AgentRole,
    pub partition: String,
    pub profile: AgentProfile,
    pub status: AgentStatus,
    pub peers: BTreeSet<AgentId>,
    pub created_at: DateTime<Utc>,
    history: Arc<Mutex<AgentHistory>>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        specialization: impl Into<String>,
        role: AgentRole,
        partition: impl Into<String>,
        profile: AgentProfile,
        history_window: usize,
    ) -> Self {
        Self {
            id,
            specialization: specialization.into(),
            role,
            partition: partition.into(),
            profile,
            status: AgentStatus::Active,
            peers: BTreeSet::new(),
            created_at: Utc::now(),
            history: Arc::new(Mutex::new(AgentHistory::new(history_window))),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AgentStatus::Active
    }

    pub fn record_outcome(&self, record: TaskRecord) {
        self.history.lock().record(record);
    }

    pub fn average_confidence(&self) -> f64 {
        self.history.lock().average_confidence()
    }

    /// Snapshot of the current history window.
    pub fn history(&self) -> AgentHistory {
        self.history.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(confidence: f64, success: bool) -> TaskRecord {
        TaskRecord {
            task_id: "t".to_string(),
            success,
            confidence,
            execution_time_ms: 10,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Classifier".parse::<AgentRole>().unwrap(), AgentRole::Classifier);
        assert_eq!("analyst".parse::<AgentRole>().unwrap(), AgentRole::Analyzer);
        assert!(matches!(
            "wizard".parse::<AgentRole>(),
            Err(SwarmError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_history_window_evicts_oldest() {
        let mut history = AgentHistory::new(2);
        history.record(record(0.2, true));
        history.record(record(0.4, true));
        history.record(record(0.8, false));

        assert_eq!(history.len(), 2);
        assert_eq!(history.total_tasks(), 3);
        assert!((history.average_confidence() - 0.6).abs() < 1e-9);
        assert!((history.success_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_clone_shares_history() {
        let agent = Agent::new(
            AgentId::from("a"),
            "cost",
            AgentRole::Optimizer,
            "us-east-1",
            AgentProfile::default(),
            10,
        );
        let handle = agent.clone();
        handle.record_outcome(record(0.9, true));

        assert_eq!(agent.history().len(), 1);
        assert!((agent.average_confidence() - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_empty_history_averages_to_zero() {
        let history = AgentHistory::new(0);
        assert!(history.is_empty());
        assert_eq!(history.average_confidence(), 0.0);
        assert_eq!(history.average_execution_time_ms(), 0.0);
    }
}
