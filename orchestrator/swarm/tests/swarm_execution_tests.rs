// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for `Swarm::execute_swarm_task`: completeness, failure
//! handling, consensus scenarios and roster bookkeeping.

mod common;

use common::{answer, parallel, swarm_with_agents, Script, ScriptedBackend};
use optiswarm_core::domain::events::SwarmEvent;
use optiswarm_core::infrastructure::EventBus;
use optiswarm_swarm::{
    AgentErrorKind, AgentId, AgentProfile, AgentRole, AgentStatus, ConsensusAlgorithm,
    SwarmBuilder, SwarmError, SwarmTask, DEFAULT_CONFIDENCE,
};
use serde_json::json;
use std::collections::BTreeSet;

fn task() -> SwarmTask {
    SwarmTask::new("intent_classification", json!({"query": "reduce overtime cost"}))
}

#[tokio::test]
async fn test_all_agents_succeed_with_identical_answers() {
    let backend = ScriptedBackend::new();
    let ids = ["a", "b", "c", "d", "e"];
    for id in ids {
        backend.script(id, answer(json!("X"), 0.8));
    }
    let swarm = swarm_with_agents(backend.clone(), parallel(), &ids);

    let result = swarm.execute_swarm_task(&task(), None).await;

    assert_eq!(result.individual_results.len(), 5);
    assert_eq!(result.consensus.value, Some(json!("X")));
    assert!((result.consensus.confidence - 0.8).abs() < 1e-9);
    assert!((result.consensus.agreement_score - 1.0).abs() < 1e-9);
    assert_eq!(
        result.consensus.algorithm_used,
        ConsensusAlgorithm::ConfidenceWeighted
    );
    assert_eq!(result.swarm_metadata.agent_count, 5);
    assert_eq!(backend.calls(), 5);
}

#[tokio::test]
async fn test_partial_failure_uses_survivors_only() {
    let backend = ScriptedBackend::new();
    backend.script("a", answer(json!("lp"), 0.6));
    backend.script("b", answer(json!("mip"), 0.7));
    backend.script("c", answer(json!("mip"), 0.9));
    backend.script("d", Script::Fail);
    backend.script("e", Script::RateLimited);
    let swarm = swarm_with_agents(backend, parallel(), &["a", "b", "c", "d", "e"]);

    let result = swarm.execute_swarm_task(&task(), None).await;

    assert_eq!(result.individual_results.len(), 5);
    assert_eq!(
        result.consensus.participating_agents,
        vec![AgentId::from("a"), AgentId::from("b"), AgentId::from("c")]
    );
    assert_eq!(result.consensus.value, Some(json!("mip")));
    assert!((result.consensus.confidence - 0.7333333333).abs() < 1e-6);
    assert_eq!(result.consensus.metadata["failed_agents"], 2);

    let rate_limited = &result.individual_results[&AgentId::from("e")];
    assert_eq!(rate_limited.confidence, 0.0);
    assert_eq!(
        rate_limited.error().map(|(_, kind)| kind),
        Some(AgentErrorKind::QuotaExceeded)
    );
}

#[tokio::test]
async fn test_total_failure_returns_null_consensus() {
    let backend = ScriptedBackend::new();
    backend.script("a", Script::Fail);
    backend.script("b", Script::RateLimited);
    backend.script("c", Script::Panic);
    let swarm = swarm_with_agents(backend, parallel(), &["a", "b", "c"]);

    for algorithm in [ConsensusAlgorithm::ConfidenceWeighted, ConsensusAlgorithm::MajorityVote] {
        let result = swarm.execute_swarm_task(&task(), Some(algorithm)).await;

        assert_eq!(result.individual_results.len(), 3);
        assert!(!result.succeeded());
        assert!(result.consensus.value.is_none());
        assert!(result.consensus.participating_agents.is_empty());
        assert!(result.consensus.error().is_some());
        assert_eq!(
            result.individual_results[&AgentId::from("c")]
                .error()
                .map(|(_, kind)| kind),
            Some(AgentErrorKind::Panicked)
        );

        let json = result.to_json();
        assert!(json["consensus"]["value"].is_null());
        assert!(json["consensus"]["metadata"]["agent_errors"]["a"].is_string());
    }
}

#[tokio::test]
async fn test_confidence_bounds_hold() {
    let backend = ScriptedBackend::new();
    backend.script("over", answer(json!(1), 4.2));
    backend.script("under", answer(json!(2), -3.0));
    backend.script("silent", Script::Silent(json!(3)));
    let swarm = swarm_with_agents(backend, parallel(), &["over", "under", "silent"]);

    let result = swarm.execute_swarm_task(&task(), None).await;

    for agent_result in result.individual_results.values() {
        assert!((0.0..=1.0).contains(&agent_result.confidence));
    }
    assert_eq!(result.individual_results[&AgentId::from("over")].confidence, 1.0);
    assert_eq!(
        result.individual_results[&AgentId::from("silent")].confidence,
        DEFAULT_CONFIDENCE
    );
    // "under" clamps to zero and drops out of consensus.
    assert_eq!(result.consensus.participating_agents.len(), 2);
    assert!((0.0..=1.0).contains(&result.consensus.confidence));
    assert!((0.0..=1.0).contains(&result.consensus.agreement_score));
}

#[tokio::test]
async fn test_majority_vote_is_deterministic_on_ties() {
    let backend = ScriptedBackend::new();
    backend.script("m1", answer(json!("scheduling"), 0.7));
    backend.script("m2", answer(json!("routing"), 0.7));
    let swarm = swarm_with_agents(backend, parallel(), &["m2", "m1"]);

    let first = swarm
        .execute_swarm_task(&task(), Some(ConsensusAlgorithm::MajorityVote))
        .await;
    let second = swarm
        .execute_swarm_task(&task(), Some(ConsensusAlgorithm::MajorityVote))
        .await;

    assert_eq!(first.consensus.value, Some(json!("scheduling")));
    assert_eq!(first.consensus.value, second.consensus.value);
    assert!((first.consensus.agreement_score - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn test_disabled_agents_are_reported_not_invoked() {
    let backend = ScriptedBackend::new();
    let mut swarm = swarm_with_agents(backend.clone(), parallel(), &["a", "b", "c"]);
    swarm
        .set_agent_status(&AgentId::from("b"), AgentStatus::Disabled)
        .unwrap();

    let result = swarm.execute_swarm_task(&task(), None).await;

    assert_eq!(result.individual_results.len(), 3);
    assert_eq!(backend.calls(), 2);
    assert_eq!(
        result.individual_results[&AgentId::from("b")]
            .error()
            .map(|(_, kind)| kind),
        Some(AgentErrorKind::AgentDisabled)
    );
    assert!(swarm.agent(&AgentId::from("b")).unwrap().history().is_empty());
    assert_eq!(swarm.get_swarm_status().active_agents, 2);
}

#[test]
fn test_peer_graph_symmetry() {
    let swarm = swarm_with_agents(ScriptedBackend::new(), parallel(), &["A", "B", "C"]);

    let peers = |id: &str| -> BTreeSet<String> {
        swarm
            .agent(&AgentId::from(id))
            .unwrap()
            .peers
            .iter()
            .map(ToString::to_string)
            .collect()
    };

    assert_eq!(peers("A"), BTreeSet::from(["B".to_string(), "C".to_string()]));
    assert_eq!(peers("B"), BTreeSet::from(["A".to_string(), "C".to_string()]));
    assert_eq!(peers("C"), BTreeSet::from(["A".to_string(), "B".to_string()]));
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut swarm = swarm_with_agents(ScriptedBackend::new(), parallel(), &["x"]);

    let err = swarm
        .add_agent("x", "impostor", AgentRole::Coordinator, "eu-west-1")
        .unwrap_err();

    assert!(matches!(err, SwarmError::DuplicateAgent(ref id) if id.as_str() == "x"));
    assert_eq!(swarm.agents().len(), 1);
    let original = swarm.agent(&AgentId::from("x")).unwrap();
    assert_eq!(original.specialization, "x specialist");
    assert_eq!(original.role, AgentRole::Analyzer);
}

#[tokio::test]
async fn test_history_and_status_are_updated() {
    let backend = ScriptedBackend::new();
    backend.script("a", answer(json!("X"), 0.9));
    backend.script("b", Script::Fail);
    let swarm = swarm_with_agents(backend, parallel(), &["a", "b"]);

    swarm.execute_swarm_task(&task(), None).await;
    swarm.execute_swarm_task(&task(), None).await;

    let a = swarm.agent(&AgentId::from("a")).unwrap();
    assert_eq!(a.history().len(), 2);
    assert!((a.average_confidence() - 0.9).abs() < 1e-9);

    let b = swarm.agent(&AgentId::from("b")).unwrap().history();
    assert_eq!(b.success_rate(), 0.0);

    let status = swarm.get_swarm_status();
    assert_eq!(status.total_tasks, 2);
    assert!((status.average_confidence - 0.45).abs() < 1e-9);
    assert_eq!(status.specializations, vec!["a specialist", "b specialist"]);
}

#[tokio::test]
async fn test_events_are_published() {
    let backend = ScriptedBackend::new();
    backend.script("a", answer(json!("X"), 0.9));
    backend.script("b", Script::Fail);
    let bus = EventBus::new(64);

    let mut swarm = SwarmBuilder::new("evented", backend)
        .strategy(parallel())
        .event_bus(bus.clone())
        .build()
        .unwrap();
    swarm
        .add_agent_with_profile("a", "cost", AgentRole::Optimizer, "us-east-1", AgentProfile::new("a"))
        .unwrap();
    swarm
        .add_agent_with_profile("b", "risk", AgentRole::Validator, "us-west-2", AgentProfile::new("b"))
        .unwrap();

    let task = task();
    let mut receiver = bus.subscribe_task(task.task_id.to_string());
    swarm.execute_swarm_task(&task, None).await;

    let mut kinds = Vec::new();
    for _ in 0..5 {
        let event = receiver.recv().await.unwrap();
        kinds.push(match event {
            SwarmEvent::TaskStarted { agent_count, .. } => {
                assert_eq!(agent_count, 2);
                "started"
            }
            SwarmEvent::BatchDispatched { batch_size, .. } => {
                assert_eq!(batch_size, 2);
                "batch"
            }
            SwarmEvent::AgentCompleted { .. } => "completed",
            SwarmEvent::AgentFailed { error_kind, .. } => {
                assert_eq!(error_kind, "invocation");
                "failed"
            }
            SwarmEvent::ConsensusReached { participating_agents, .. } => {
                assert_eq!(participating_agents, 1);
                "consensus"
            }
            other => panic!("unexpected event {:?}", other),
        });
    }

    assert_eq!(kinds[0], "started");
    assert_eq!(kinds[1], "batch");
    assert_eq!(kinds[4], "consensus");
    assert!(kinds.contains(&"completed") && kinds.contains(&"failed"));
}

#[tokio::test]
async fn test_empty_swarm_returns_null_consensus() {
    let swarm = SwarmBuilder::new("empty", ScriptedBackend::new())
        .build()
        .unwrap();

    let result = swarm.execute_swarm_task(&task(), None).await;

    assert!(result.individual_results.is_empty());
    assert!(result.consensus.value.is_none());
    assert_eq!(result.swarm_metadata.strategy, "batched");
}
