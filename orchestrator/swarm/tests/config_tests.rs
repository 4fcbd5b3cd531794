// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Building a swarm from a YAML manifest and running it against an
//! OpenAI-compatible endpoint.

use optiswarm_core::domain::config::SwarmConfigManifest;
use optiswarm_core::infrastructure::llm::ProviderRegistry;
use optiswarm_swarm::infrastructure::LlmInferenceBackend;
use optiswarm_swarm::{AgentId, AgentRole, SwarmBuilder, SwarmError, SwarmTask};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const MANIFEST: &str = r#"
apiVersion: optiswarm.io/v1
kind: SwarmConfig
metadata:
  name: validation-swarm
spec:
  llm_providers:
    - name: gateway
      type: openai-compatible
      endpoint: ENDPOINT
      models:
        - alias: default
          model: gpt-4o-mini
          cost_per_1k_tokens: 2.0
  llm_selection:
    max_retries: 0
  swarm:
    variant: solution_validation
    strategy: parallel
    default_algorithm: majority_vote
    agent_timeout: 10s
    history_window: 5
    partition_quotas:
      us-east-1: 60
    agents:
      - id: compliance
        specialization: regulatory compliance
        role: validator
        partition: eu-west-1
"#;

const COMPLETION: &str = r#"{
  "choices": [{"message": {"role": "assistant", "content": "```json\n{\"value\": \"feasible\", \"confidence\": 0.8, \"reasoning\": \"all constraints hold\"}\n```"}, "finish_reason": "stop"}],
  "usage": {"prompt_tokens": 400, "completion_tokens": 100, "total_tokens": 500}
}"#;

fn manifest(endpoint: &str) -> SwarmConfigManifest {
    let manifest =
        SwarmConfigManifest::from_yaml_str(&MANIFEST.replace("ENDPOINT", endpoint)).unwrap();
    manifest.validate().unwrap();
    manifest
}

#[test]
fn test_builder_applies_manifest_settings() {
    let manifest = manifest("http://localhost:9");
    let registry = Arc::new(ProviderRegistry::from_config(&manifest).unwrap());
    let backend = Arc::new(LlmInferenceBackend::new(registry));

    let swarm = SwarmBuilder::from_settings("validation", backend, &manifest.spec.swarm)
        .unwrap()
        .build()
        .unwrap();

    let status = swarm.get_swarm_status();
    assert_eq!(status.agent_count, 5);
    assert_eq!(status.strategy, "parallel");
    assert_eq!(swarm.strategy().max_parallel_requests, 10);

    let compliance = swarm.agent(&AgentId::from("compliance")).unwrap();
    assert_eq!(compliance.role, AgentRole::Validator);
    assert_eq!(compliance.profile.as_str(), "default");
    assert_eq!(compliance.peers.len(), 4);
}

#[test]
fn test_manifest_with_unknown_role_is_rejected() {
    let mut manifest = manifest("http://localhost:9");
    manifest.spec.swarm.agents[0].role = "oracle".to_string();
    let registry = Arc::new(ProviderRegistry::new(0, Duration::ZERO));

    let result = SwarmBuilder::from_settings(
        "validation",
        Arc::new(LlmInferenceBackend::new(registry)),
        &manifest.spec.swarm,
    );

    assert!(matches!(result, Err(SwarmError::UnknownRole(_))));
}

#[tokio::test]
async fn test_manifest_swarm_reaches_consensus_over_http() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(COMPLETION)
        .expect(5)
        .create_async()
        .await;

    let manifest = manifest(&format!("{}/v1", server.url()));
    let registry = Arc::new(ProviderRegistry::from_config(&manifest).unwrap());
    let swarm = SwarmBuilder::from_settings(
        "validation",
        Arc::new(LlmInferenceBackend::new(registry)),
        &manifest.spec.swarm,
    )
    .unwrap()
    .build()
    .unwrap();

    let task = SwarmTask::new(
        "solution_validation",
        json!({"solution": {"x": 4, "y": 2}, "constraints": ["x + y <= 6"]}),
    );
    let result = swarm.execute_swarm_task(&task, None).await;

    mock.assert_async().await;
    assert_eq!(result.individual_results.len(), 5);
    assert_eq!(result.consensus.value, Some(json!("feasible")));
    assert!((result.consensus.confidence - 0.8).abs() < 1e-9);
    assert!((result.consensus.agreement_score - 1.0).abs() < 1e-9);
    assert_eq!(result.swarm_metadata.strategy, "parallel");

    let compliance = &result.individual_results[&AgentId::from("compliance")];
    assert_eq!(compliance.metrics.tokens, Some(500));
    assert!((compliance.metrics.cost.unwrap() - 1.0).abs() < 1e-9);
}
