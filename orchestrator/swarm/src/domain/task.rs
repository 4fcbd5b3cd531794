// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a random task id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A unit of work submitted to a swarm. Every agent reads the same task;
/// the swarm never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmTask {
    pub task_id: TaskId,
    pub task_type: String,
    pub payload: Value,
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl SwarmTask {
    pub fn new(task_type: impl Into<String>, payload: Value) -> Self {
        Self {
            task_id: TaskId::new(),
            task_type: task_type.into(),
            payload,
            context: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Use a caller-supplied id instead of a generated one.
    pub fn with_id(mut self, task_id: impl Into<TaskId>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let task = SwarmTask::new("intent_classification", json!({"query": "minimize cost"}))
            .with_id("task-1")
            .with_context("industry", json!("manufacturing"));

        assert_eq!(task.task_id.as_str(), "task-1");
        assert_eq!(task.context["industry"], json!("manufacturing"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(TaskId::new(), TaskId::new());
    }
}
