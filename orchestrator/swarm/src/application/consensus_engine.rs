// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Consensus Engine
//!
//! Reduces per-agent results to one [`ConsensusResult`].
//!
//! # Algorithms
//!
//! - **Confidence-weighted** (default): answers are combined with weights
//!   proportional to confidence. Numbers are averaged, objects are combined
//!   key by key, anything else is decided by weighted plurality. The
//!   agreement score is `1 - clamp(stddev / mean)` over the surviving
//!   confidences, so a wider spread never scores higher.
//! - **Majority vote**: answers are grouped by a vote key (canonical JSON
//!   unless the caller supplies one); the group with the largest confidence
//!   mass wins and agreement is its share of the total mass.
//!
//! Results with zero confidence, a null answer or an error never
//! participate. When nothing
//! survives, the value is null and `metadata.error` explains why.
//!
//! Exact ties go to the group whose sorted agent ids compare first.

use crate::domain::agent::AgentId;
use crate::domain::consensus::{ConsensusAlgorithm, ConsensusResult};
use crate::domain::result::{clamp_unit, AgentResult, AgentResults};
use metrics::counter;
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

const TIE_EPSILON: f64 = 1e-12;

/// Maps an answer to the key majority voting groups by.
pub type VoteKey = Arc<dyn Fn(&Value) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ConsensusEngine {
    vote_key: VoteKey,
}

struct Survivor<'a> {
    id: &'a AgentId,
    confidence: f64,
    answer: Value,
}

struct Group<'a> {
    answer: &'a Value,
    mass: f64,
    ids: Vec<&'a AgentId>,
    confidences: Vec<f64>,
}

impl ConsensusEngine {
    pub fn new() -> Self {
        Self {
            vote_key: Arc::new(canonical_key),
        }
    }

    /// Replace the equality key used by majority voting.
    pub fn with_vote_key<F>(mut self, key: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.vote_key = Arc::new(key);
        self
    }

    /// A panicking vote key falls back to the canonical JSON key.
    fn key_of(&self, answer: &Value) -> String {
        catch_unwind(AssertUnwindSafe(|| (self.vote_key)(answer))).unwrap_or_else(|_| {
            warn!("Vote key panicked; using canonical JSON");
            canonical_key(answer)
        })
    }

    pub fn aggregate(
        &self,
        results: &AgentResults,
        algorithm: ConsensusAlgorithm,
    ) -> ConsensusResult {
        let survivors: Vec<Survivor<'_>> = results
            .iter()
            .filter(|(_, r)| r.is_success() && r.confidence > 0.0)
            .filter_map(|(id, r)| {
                r.answer().map(|answer| Survivor {
                    id,
                    confidence: r.confidence,
                    answer,
                })
            })
            .collect();

        let mut metadata = Map::new();
        metadata.insert("total_agents".to_string(), Value::from(results.len()));
        metadata.insert(
            "failed_agents".to_string(),
            Value::from(results.len() - survivors.len()),
        );

        if survivors.is_empty() {
            let agent_errors: Map<String, Value> = results
                .iter()
                .map(|(id, r)| (id.to_string(), Value::String(failure_reason(r))))
                .collect();
            metadata.insert("agent_errors".to_string(), Value::Object(agent_errors));

            let reason = if results.is_empty() {
                "No agents were available to execute the task"
            } else {
                "All agents failed to produce a usable result"
            };
            warn!(algorithm = %algorithm, agents = results.len(), "{}", reason);
            counter!(
                "optiswarm_consensus_total",
                "algorithm" => algorithm.as_str(),
                "outcome" => "failed"
            )
            .increment(1);
            return ConsensusResult::failed(algorithm, reason, metadata);
        }

        let result = match algorithm {
            ConsensusAlgorithm::ConfidenceWeighted => confidence_weighted(&survivors, metadata),
            ConsensusAlgorithm::MajorityVote => self.majority_vote(&survivors, metadata),
        };

        debug!(
            algorithm = %algorithm,
            confidence = result.confidence,
            agreement = result.agreement_score,
            participants = result.participating_agents.len(),
            "Consensus reached"
        );
        counter!(
            "optiswarm_consensus_total",
            "algorithm" => algorithm.as_str(),
            "outcome" => "reached"
        )
        .increment(1);
        result
    }

    fn majority_vote(
        &self,
        survivors: &[Survivor<'_>],
        mut metadata: Map<String, Value>,
    ) -> ConsensusResult {
        let mut groups: BTreeMap<String, Group<'_>> = BTreeMap::new();
        for survivor in survivors {
            let group = groups
                .entry(self.key_of(&survivor.answer))
                .or_insert_with(|| Group {
                    answer: &survivor.answer,
                    mass: 0.0,
                    ids: Vec::new(),
                    confidences: Vec::new(),
                });
            group.mass += survivor.confidence;
            group.ids.push(survivor.id);
            group.confidences.push(survivor.confidence);
        }

        let total_mass: f64 = survivors.iter().map(|s| s.confidence).sum();
        let distribution: Map<String, Value> = groups
            .iter()
            .map(|(key, group)| (key.clone(), number(group.mass)))
            .collect();

        let winner = groups.values().reduce(|best, candidate| {
            if beats(candidate.mass, &candidate.ids, best.mass, &best.ids) {
                candidate
            } else {
                best
            }
        });

        let Some(winner) = winner else {
            return ConsensusResult::failed(
                ConsensusAlgorithm::MajorityVote,
                "No votes were cast",
                metadata,
            );
        };

        metadata.insert("vote_distribution".to_string(), Value::Object(distribution));
        metadata.insert(
            "winning_agents".to_string(),
            Value::Array(winner.ids.iter().map(|id| Value::String(id.to_string())).collect()),
        );

        ConsensusResult {
            value: Some(winner.answer.clone()),
            confidence: clamp_unit(mean(&winner.confidences)),
            agreement_score: clamp_unit(winner.mass / total_mass),
            participating_agents: survivors.iter().map(|s| s.id.clone()).collect(),
            algorithm_used: ConsensusAlgorithm::MajorityVote,
            metadata,
        }
    }
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn confidence_weighted(
    survivors: &[Survivor<'_>],
    mut metadata: Map<String, Value>,
) -> ConsensusResult {
    let confidences: Vec<f64> = survivors.iter().map(|s| s.confidence).collect();
    let total: f64 = confidences.iter().sum();

    let weighted: Vec<(&AgentId, &Value, f64)> = survivors
        .iter()
        .map(|s| (s.id, &s.answer, s.confidence / total))
        .collect();

    let weights: Map<String, Value> = weighted
        .iter()
        .map(|(id, _, w)| (id.to_string(), number(*w)))
        .collect();
    metadata.insert("weights".to_string(), Value::Object(weights));

    ConsensusResult {
        value: Some(combine(&weighted)),
        confidence: clamp_unit(mean(&confidences)),
        agreement_score: agreement_from_dispersion(&confidences),
        participating_agents: survivors.iter().map(|s| s.id.clone()).collect(),
        algorithm_used: ConsensusAlgorithm::ConfidenceWeighted,
        metadata,
    }
}

/// Weighted combination of answers. Weights need not sum to one.
fn combine(entries: &[(&AgentId, &Value, f64)]) -> Value {
    let Some((_, first, _)) = entries.first() else {
        return Value::Null;
    };
    if entries.iter().all(|(_, v, _)| v == first) {
        return (*first).clone();
    }

    let total: f64 = entries.iter().map(|(_, _, w)| w).sum();

    if entries.iter().all(|(_, v, _)| v.is_number()) {
        let sum: f64 = entries
            .iter()
            .map(|(_, v, w)| v.as_f64().unwrap_or(0.0) * w)
            .sum();
        return number(sum / total);
    }

    if entries.iter().all(|(_, v, _)| v.is_object()) {
        let keys: BTreeSet<&String> = entries
            .iter()
            .filter_map(|(_, v, _)| v.as_object())
            .flat_map(|o| o.keys())
            .collect();

        let mut combined = Map::new();
        for key in keys {
            let supplied: Vec<(&AgentId, &Value, f64)> = entries
                .iter()
                .filter_map(|(id, v, w)| v.get(key.as_str()).map(|field| (*id, field, *w)))
                .collect();
            combined.insert(key.clone(), combine(&supplied));
        }
        return Value::Object(combined);
    }

    plurality(entries)
}

fn plurality(entries: &[(&AgentId, &Value, f64)]) -> Value {
    let mut groups: BTreeMap<String, (&Value, f64, Vec<&AgentId>)> = BTreeMap::new();
    for (id, value, weight) in entries {
        let group = groups
            .entry(canonical_key(value))
            .or_insert_with(|| (*value, 0.0, Vec::new()));
        group.1 += weight;
        group.2.push(*id);
    }
    for group in groups.values_mut() {
        group.2.sort();
    }

    groups
        .values()
        .reduce(|best, candidate| {
            if beats(candidate.1, &candidate.2, best.1, &best.2) {
                candidate
            } else {
                best
            }
        })
        .map(|(value, _, _)| (*value).clone())
        .unwrap_or(Value::Null)
}

/// Larger mass wins; on an exact tie, the smaller sorted id list wins.
fn beats(mass: f64, ids: &[&AgentId], best_mass: f64, best_ids: &[&AgentId]) -> bool {
    if (mass - best_mass).abs() <= TIE_EPSILON {
        ids < best_ids
    } else {
        mass > best_mass
    }
}

fn agreement_from_dispersion(confidences: &[f64]) -> f64 {
    let mean = mean(confidences);
    if mean <= 0.0 {
        return 0.0;
    }
    let variance = confidences.iter().map(|c| (c - mean).powi(2)).sum::<f64>()
        / confidences.len() as f64;
    let coefficient_of_variation = variance.sqrt() / mean;
    clamp_unit(1.0 - coefficient_of_variation.clamp(0.0, 1.0))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

fn canonical_key(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

fn failure_reason(result: &AgentResult) -> String {
    match result.error() {
        Some((error, _)) => error.to_string(),
        None if result.answer().is_none() => "Returned a null answer".to_string(),
        None => "Reported zero confidence".to_string(),
    }
}
