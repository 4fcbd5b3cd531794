// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Scripted inference backend shared by the integration tests.
//!
//! Agents are registered with their own id as profile, so the backend can
//! look up what each agent should do.

#![allow(dead_code)]

use async_trait::async_trait;
use optiswarm_swarm::{
    AgentProfile, AgentRole, ExecutionStrategy, InferenceBackend, InferenceError,
    InferenceResponse, Swarm, SwarmBuilder,
};
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Script {
    Answer { value: Value, confidence: f64 },
    /// Answer without a self-reported confidence.
    Silent(Value),
    Fail,
    RateLimited,
    Hang,
    Panic,
}

pub struct ScriptedBackend {
    scripts: Mutex<HashMap<String, Script>>,
    pub calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn script(&self, profile: &str, script: Script) {
        self.scripts.lock().insert(profile.to_string(), script);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn invoke(
        &self,
        _prompt: &str,
        _context: &BTreeMap<String, Value>,
        profile: &AgentProfile,
    ) -> Result<InferenceResponse, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .get(profile.as_str())
            .cloned()
            .unwrap_or(Script::Answer {
                value: json!("default"),
                confidence: 0.5,
            });

        match script {
            Script::Answer { value, confidence } => {
                Ok(InferenceResponse::new(object(value)).with_confidence(confidence))
            }
            Script::Silent(value) => Ok(InferenceResponse::new(object(value))),
            Script::Fail => Err(InferenceError::Invocation("connection refused".into())),
            Script::RateLimited => Err(InferenceError::QuotaExceeded("429 Too Many Requests".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(InferenceError::Invocation("unreachable".into()))
            }
            Script::Panic => panic!("backend bug"),
        }
    }
}

fn object(value: Value) -> Map<String, Value> {
    let mut result = Map::new();
    result.insert("value".to_string(), value);
    result
}

pub fn answer(value: Value, confidence: f64) -> Script {
    Script::Answer { value, confidence }
}

pub fn parallel() -> ExecutionStrategy {
    ExecutionStrategy::builtin("parallel").unwrap()
}

/// A swarm whose agents `ids` all sit in one partition, with the agent id
/// as profile.
pub fn swarm_with_agents(
    backend: Arc<ScriptedBackend>,
    strategy: ExecutionStrategy,
    ids: &[&str],
) -> Swarm {
    let mut swarm = SwarmBuilder::new("test-swarm", backend)
        .strategy(strategy)
        .build()
        .unwrap();
    for id in ids {
        swarm
            .add_agent_with_profile(
                *id,
                format!("{} specialist", id),
                AgentRole::Analyzer,
                "us-east-1",
                AgentProfile::new(*id),
            )
            .unwrap();
    }
    swarm
}
