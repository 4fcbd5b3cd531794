// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::AgentId;
use crate::domain::error::SwarmError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusAlgorithm {
    #[default]
    ConfidenceWeighted,
    MajorityVote,
}

impl ConsensusAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusAlgorithm::ConfidenceWeighted => "confidence_weighted",
            ConsensusAlgorithm::MajorityVote => "majority_vote",
        }
    }
}

impl fmt::Display for ConsensusAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsensusAlgorithm {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "confidence_weighted" | "weighted" => Ok(ConsensusAlgorithm::ConfidenceWeighted),
            "majority_vote" | "majority" => Ok(ConsensusAlgorithm::MajorityVote),
            other => Err(SwarmError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Reduction of all agent results for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// `None` (serialized as `null`) when no agent produced a usable result.
    pub value: Option<Value>,
    pub confidence: f64,
    pub agreement_score: f64,
    pub participating_agents: Vec<AgentId>,
    pub algorithm_used: ConsensusAlgorithm,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ConsensusResult {
    /// Null-valued result carrying `error` in its metadata.
    pub fn failed(
        algorithm: ConsensusAlgorithm,
        error: impl Into<String>,
        mut metadata: Map<String, Value>,
    ) -> Self {
        metadata.insert("error".to_string(), Value::String(error.into()));
        Self {
            value: None,
            confidence: 0.0,
            agreement_score: 0.0,
            participating_agents: Vec::new(),
            algorithm_used: algorithm,
            metadata,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.metadata.get("error").and_then(Value::as_str)
    }
}
