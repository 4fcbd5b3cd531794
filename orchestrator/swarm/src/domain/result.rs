// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent and Swarm Results
//!
//! [`AgentResult`] is created exactly once per (agent, task) pair. Failure is
//! an explicit [`AgentOutcome::Failure`] variant with a zero confidence, so
//! the success/error branch is decided by the type rather than by key
//! presence.

use crate::domain::agent::AgentId;
use crate::domain::consensus::{ConsensusAlgorithm, ConsensusResult};
use crate::domain::roster::SwarmId;
use crate::domain::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Why an agent produced no usable answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentErrorKind {
    Invocation,
    QuotaExceeded,
    Timeout,
    MalformedResponse,
    Cancelled,
    AgentDisabled,
    Panicked,
}

impl AgentErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentErrorKind::Invocation => "invocation",
            AgentErrorKind::QuotaExceeded => "quota_exceeded",
            AgentErrorKind::Timeout => "timeout",
            AgentErrorKind::MalformedResponse => "malformed_response",
            AgentErrorKind::Cancelled => "cancelled",
            AgentErrorKind::AgentDisabled => "agent_disabled",
            AgentErrorKind::Panicked => "panicked",
        }
    }
}

impl fmt::Display for AgentErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentOutcome {
    Success {
        result: Map<String, Value>,
    },
    Failure {
        error: String,
        error_kind: AgentErrorKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// One agent's answer to one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult {
    pub agent_id: AgentId,
    pub specialization: String,
    pub partition: String,
    pub outcome: AgentOutcome,
    /// In `[0.0, 1.0]`; always 0.0 for failures.
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub metrics: ExecutionMetrics,
}

impl AgentResult {
    /// Confidence is clamped to `[0.0, 1.0]`; NaN becomes 0.0.
    pub fn success(
        agent_id: AgentId,
        specialization: impl Into<String>,
        partition: impl Into<String>,
        result: Map<String, Value>,
        confidence: f64,
        metrics: ExecutionMetrics,
    ) -> Self {
        Self {
            agent_id,
            specialization: specialization.into(),
            partition: partition.into(),
            outcome: AgentOutcome::Success { result },
            confidence: clamp_unit(confidence),
            timestamp: Utc::now(),
            metrics,
        }
    }

    pub fn failure(
        agent_id: AgentId,
        specialization: impl Into<String>,
        partition: impl Into<String>,
        error: impl Into<String>,
        error_kind: AgentErrorKind,
        metrics: ExecutionMetrics,
    ) -> Self {
        Self {
            agent_id,
            specialization: specialization.into(),
            partition: partition.into(),
            outcome: AgentOutcome::Failure {
                error: error.into(),
                error_kind,
            },
            confidence: 0.0,
            timestamp: Utc::now(),
            metrics,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, AgentOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<(&str, AgentErrorKind)> {
        match &self.outcome {
            AgentOutcome::Failure { error, error_kind } => Some((error.as_str(), *error_kind)),
            AgentOutcome::Success { .. } => None,
        }
    }

    /// The agent's answer: `result["value"]` when present, otherwise the
    /// whole result object. `None` for failures and for a null `value`.
    pub fn answer(&self) -> Option<Value> {
        match &self.outcome {
            AgentOutcome::Success { result } => match result.get("value") {
                Some(Value::Null) => None,
                Some(value) => Some(value.clone()),
                None => Some(Value::Object(result.clone())),
            },
            AgentOutcome::Failure { .. } => None,
        }
    }

    /// Canonical serialized form.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Per-task results keyed by agent id. Iteration order is by id, not by
/// completion.
pub type AgentResults = BTreeMap<AgentId, AgentResult>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmMetadata {
    pub swarm_id: SwarmId,
    pub name: String,
    pub agent_count: usize,
    pub algorithm: ConsensusAlgorithm,
    pub strategy: String,
    pub timestamp: DateTime<Utc>,
}

/// Top-level response of one `execute_swarm_task` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmResult {
    pub task_id: TaskId,
    pub consensus: ConsensusResult,
    pub individual_results: AgentResults,
    pub execution_time_ms: u64,
    pub swarm_metadata: SwarmMetadata,
}

impl SwarmResult {
    pub fn succeeded(&self) -> bool {
        self.consensus.value.is_some()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_success_clamps_confidence() {
        let result = AgentResult::success(
            "a".into(),
            "cost",
            "us-east-1",
            object(json!({"value": "lp"})),
            1.7,
            ExecutionMetrics::default(),
        );
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.answer(), Some(json!("lp")));

        let nan = AgentResult::success(
            "a".into(),
            "cost",
            "us-east-1",
            Map::new(),
            f64::NAN,
            ExecutionMetrics::default(),
        );
        assert_eq!(nan.confidence, 0.0);
    }

    #[test]
    fn test_answer_falls_back_to_whole_result() {
        let result = AgentResult::success(
            "a".into(),
            "cost",
            "us-east-1",
            object(json!({"model_type": "mip", "variables": 12})),
            0.5,
            ExecutionMetrics::default(),
        );
        assert_eq!(
            result.answer(),
            Some(json!({"model_type": "mip", "variables": 12}))
        );
    }

    #[test]
    fn test_null_value_is_no_answer() {
        let result = AgentResult::success(
            "a".into(),
            "cost",
            "us-east-1",
            object(json!({"value": null, "reasoning": "undecided"})),
            0.7,
            ExecutionMetrics::default(),
        );
        assert!(result.is_success());
        assert_eq!(result.answer(), None);
    }

    #[test]
    fn test_failure_serializes_with_error_kind() {
        let result = AgentResult::failure(
            "a".into(),
            "risk",
            "eu-west-1",
            "Timed out after 30s",
            AgentErrorKind::Timeout,
            ExecutionMetrics {
                execution_time_ms: 30_000,
                ..Default::default()
            },
        );
        assert!(!result.is_success());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.answer(), None);

        let json = result.to_json();
        assert_eq!(json["outcome"]["status"], "failure");
        assert_eq!(json["outcome"]["error_kind"], "timeout");
        assert_eq!(json["metrics"]["execution_time_ms"], 30_000);
        assert!(json["metrics"].get("cost").is_none());
    }
}
