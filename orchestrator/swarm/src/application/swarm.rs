// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Swarm
//!
//! The aggregate callers talk to: owns a roster, an executor and a consensus
//! engine, and exposes [`Swarm::execute_swarm_task`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Run one task across every agent and reduce the answers
//! - **Integration:** Caller → Swarm → ParallelExecutor / ConsensusEngine
//!
//! Registration (`add_agent`, `set_agent_status`) takes `&mut self`, so the
//! roster has a single writer by construction. Task execution takes `&self`
//! and only writes to each agent's own history lock.

use crate::application::consensus_engine::ConsensusEngine;
use crate::application::executor::{ExecutionObserver, ExecutorSettings, ParallelExecutor};
use crate::application::prompt::{AgentPromptBuilder, DefaultPromptBuilder};
use crate::application::variants::SwarmVariant;
use crate::domain::agent::{Agent, AgentId, AgentProfile, AgentRole, AgentStatus, TaskRecord};
use crate::domain::consensus::ConsensusAlgorithm;
use crate::domain::error::SwarmError;
use crate::domain::inference::InferenceBackend;
use crate::domain::result::{AgentErrorKind, AgentResult, SwarmMetadata, SwarmResult};
use crate::domain::roster::{SwarmId, SwarmRoster};
use crate::domain::strategy::ExecutionStrategy;
use crate::domain::task::SwarmTask;
use chrono::Utc;
use optiswarm_core::domain::config::SwarmSettings;
use optiswarm_core::domain::events::SwarmEvent;
use optiswarm_core::infrastructure::EventBus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_HISTORY_WINDOW: usize = 100;

/// Read-only snapshot for health and observability collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmStatus {
    pub swarm_id: SwarmId,
    pub name: String,
    pub agent_count: usize,
    pub active_agents: usize,
    pub total_tasks: u64,
    /// Mean of the agents' rolling average confidences; agents without
    /// history are ignored.
    pub average_confidence: f64,
    /// Mean wall-clock time of a whole `execute_swarm_task` call.
    pub average_execution_time_ms: f64,
    pub partitions: Vec<String>,
    pub specializations: Vec<String>,
    pub strategy: String,
}

#[derive(Debug, Default)]
struct TaskStats {
    total_tasks: u64,
    total_execution_ms: u64,
}

pub struct Swarm {
    id: SwarmId,
    name: String,
    roster: SwarmRoster,
    executor: ParallelExecutor,
    engine: ConsensusEngine,
    prompts: Arc<dyn AgentPromptBuilder>,
    default_algorithm: ConsensusAlgorithm,
    history_window: usize,
    event_bus: Option<EventBus>,
    stats: Mutex<TaskStats>,
}

impl Swarm {
    pub fn new(
        name: impl Into<String>,
        executor: ParallelExecutor,
        engine: ConsensusEngine,
        prompts: Arc<dyn AgentPromptBuilder>,
    ) -> Self {
        Self {
            id: SwarmId::new(),
            name: name.into(),
            roster: SwarmRoster::new(),
            executor,
            engine,
            prompts,
            default_algorithm: ConsensusAlgorithm::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
            event_bus: None,
            stats: Mutex::new(TaskStats::default()),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn with_default_algorithm(mut self, algorithm: ConsensusAlgorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    /// Applies to agents registered afterwards.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window.max(1);
        self
    }

    pub fn id(&self) -> SwarmId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> &ExecutionStrategy {
        self.executor.strategy()
    }

    pub fn add_agent(
        &mut self,
        agent_id: impl Into<AgentId>,
        specialization: impl Into<String>,
        role: AgentRole,
        partition: impl Into<String>,
    ) -> Result<(), SwarmError> {
        self.add_agent_with_profile(
            agent_id,
            specialization,
            role,
            partition,
            AgentProfile::default(),
        )
    }

    /// Register an agent and link it to every existing agent. Fails with
    /// [`SwarmError::DuplicateAgent`] if the id is taken.
    pub fn add_agent_with_profile(
        &mut self,
        agent_id: impl Into<AgentId>,
        specialization: impl Into<String>,
        role: AgentRole,
        partition: impl Into<String>,
        profile: AgentProfile,
    ) -> Result<(), SwarmError> {
        let agent = Agent::new(
            agent_id.into(),
            specialization,
            role,
            partition,
            profile,
            self.history_window,
        );
        let event = SwarmEvent::AgentRegistered {
            swarm_id: self.id.to_string(),
            agent_id: agent.id.to_string(),
            specialization: agent.specialization.clone(),
            partition: agent.partition.clone(),
            registered_at: agent.created_at,
        };

        info!(
            swarm = %self.name,
            agent_id = %agent.id,
            role = %agent.role,
            partition = %agent.partition,
            "Registering agent"
        );
        self.roster.add_agent(agent)?;
        self.publish(event);
        Ok(())
    }

    pub fn set_agent_status(
        &mut self,
        agent_id: &AgentId,
        status: AgentStatus,
    ) -> Result<(), SwarmError> {
        info!(swarm = %self.name, agent_id = %agent_id, ?status, "Updating agent status");
        self.roster.set_status(agent_id, status)
    }

    pub fn agent(&self, agent_id: &AgentId) -> Option<&Agent> {
        self.roster.get(agent_id)
    }

    /// Agents in registration order.
    pub fn agents(&self) -> &[Agent] {
        self.roster.agents()
    }

    /// Run `task` on every agent and reduce the answers. Never fails: errors
    /// end up in the returned result.
    pub async fn execute_swarm_task(
        &self,
        task: &SwarmTask,
        algorithm: Option<ConsensusAlgorithm>,
    ) -> SwarmResult {
        self.execute_swarm_task_with_cancel(task, algorithm, CancellationToken::new())
            .await
    }

    /// Like [`Swarm::execute_swarm_task`], but cancelling `cancel` aborts
    /// in-flight backend calls and skips remaining batch delays. Every agent
    /// still gets a result.
    pub async fn execute_swarm_task_with_cancel(
        &self,
        task: &SwarmTask,
        algorithm: Option<ConsensusAlgorithm>,
        cancel: CancellationToken,
    ) -> SwarmResult {
        let started = Instant::now();
        let algorithm = algorithm.unwrap_or(self.default_algorithm);
        let agents = self.roster.agents();

        info!(
            swarm = %self.name,
            task_id = %task.task_id,
            task_type = %task.task_type,
            agents = agents.len(),
            strategy = %self.strategy().name,
            "Executing swarm task"
        );
        self.publish(SwarmEvent::TaskStarted {
            swarm_id: self.id.to_string(),
            task_id: task.task_id.to_string(),
            task_type: task.task_type.clone(),
            agent_count: agents.len(),
            strategy: self.strategy().name.clone(),
            started_at: Utc::now(),
        });

        let observer = EventObserver {
            bus: self.event_bus.as_ref(),
            swarm_id: self.id.to_string(),
            task_id: task.task_id.to_string(),
        };
        let results = self
            .executor
            .execute_agents_parallel(agents, task, self.prompts.as_ref(), &cancel, &observer)
            .await;

        let consensus = self.engine.aggregate(&results, algorithm);

        for agent in agents {
            if let Some(result) = results.get(&agent.id) {
                if result.error().map(|(_, kind)| kind) == Some(AgentErrorKind::AgentDisabled) {
                    continue;
                }
                agent.record_outcome(TaskRecord {
                    task_id: task.task_id.to_string(),
                    success: result.is_success(),
                    confidence: result.confidence,
                    execution_time_ms: result.metrics.execution_time_ms,
                    recorded_at: result.timestamp,
                });
            }
        }

        match &consensus.value {
            Some(_) => {
                info!(
                    swarm = %self.name,
                    task_id = %task.task_id,
                    confidence = consensus.confidence,
                    agreement = consensus.agreement_score,
                    participants = consensus.participating_agents.len(),
                    "Consensus reached"
                );
                self.publish(SwarmEvent::ConsensusReached {
                    swarm_id: self.id.to_string(),
                    task_id: task.task_id.to_string(),
                    algorithm: algorithm.to_string(),
                    confidence: consensus.confidence,
                    agreement_score: consensus.agreement_score,
                    participating_agents: consensus.participating_agents.len(),
                    reached_at: Utc::now(),
                });
            }
            None => {
                let reason = consensus.error().unwrap_or("No usable agent results").to_string();
                warn!(swarm = %self.name, task_id = %task.task_id, "Consensus failed: {}", reason);
                self.publish(SwarmEvent::ConsensusFailed {
                    swarm_id: self.id.to_string(),
                    task_id: task.task_id.to_string(),
                    algorithm: algorithm.to_string(),
                    reason,
                    failed_at: Utc::now(),
                });
            }
        }

        let execution_time_ms = started.elapsed().as_millis() as u64;
        {
            let mut stats = self.stats.lock();
            stats.total_tasks += 1;
            stats.total_execution_ms += execution_time_ms;
        }

        SwarmResult {
            task_id: task.task_id.clone(),
            consensus,
            individual_results: results,
            execution_time_ms,
            swarm_metadata: SwarmMetadata {
                swarm_id: self.id,
                name: self.name.clone(),
                agent_count: agents.len(),
                algorithm,
                strategy: self.strategy().name.clone(),
                timestamp: Utc::now(),
            },
        }
    }

    pub fn get_swarm_status(&self) -> SwarmStatus {
        let (total_tasks, total_execution_ms) = {
            let stats = self.stats.lock();
            (stats.total_tasks, stats.total_execution_ms)
        };

        let averages: Vec<f64> = self
            .roster
            .agents()
            .iter()
            .map(Agent::history)
            .filter(|h| !h.is_empty())
            .map(|h| h.average_confidence())
            .collect();
        let average_confidence = if averages.is_empty() {
            0.0
        } else {
            averages.iter().sum::<f64>() / averages.len() as f64
        };

        SwarmStatus {
            swarm_id: self.id,
            name: self.name.clone(),
            agent_count: self.roster.len(),
            active_agents: self.roster.active_count(),
            total_tasks,
            average_confidence,
            average_execution_time_ms: if total_tasks == 0 {
                0.0
            } else {
                total_execution_ms as f64 / total_tasks as f64
            },
            partitions: self.roster.partitions().into_iter().collect(),
            specializations: self.roster.specializations().into_iter().collect(),
            strategy: self.strategy().name.clone(),
        }
    }

    fn publish(&self, event: SwarmEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

/// Forwards executor progress to the event bus.
struct EventObserver<'a> {
    bus: Option<&'a EventBus>,
    swarm_id: String,
    task_id: String,
}

impl ExecutionObserver for EventObserver<'_> {
    fn on_batch_dispatched(&self, batch_index: usize, agents: &[AgentId]) {
        if let Some(bus) = self.bus {
            bus.publish(SwarmEvent::BatchDispatched {
                swarm_id: self.swarm_id.clone(),
                task_id: self.task_id.clone(),
                batch_index,
                batch_size: agents.len(),
                dispatched_at: Utc::now(),
            });
        }
    }

    fn on_agent_finished(&self, result: &AgentResult) {
        let Some(bus) = self.bus else {
            return;
        };
        let event = match result.error() {
            None => SwarmEvent::AgentCompleted {
                swarm_id: self.swarm_id.clone(),
                task_id: self.task_id.clone(),
                agent_id: result.agent_id.to_string(),
                confidence: result.confidence,
                execution_time_ms: result.metrics.execution_time_ms,
                completed_at: result.timestamp,
            },
            Some((error, kind)) => SwarmEvent::AgentFailed {
                swarm_id: self.swarm_id.clone(),
                task_id: self.task_id.clone(),
                agent_id: result.agent_id.to_string(),
                error_kind: kind.to_string(),
                error: error.to_string(),
                failed_at: result.timestamp,
            },
        };
        bus.publish(event);
    }
}

/// Roster entry for [`SwarmBuilder::agent`].
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub id: AgentId,
    pub specialization: String,
    pub role: AgentRole,
    pub partition: String,
    pub profile: AgentProfile,
}

impl AgentSpec {
    pub fn new(
        id: impl Into<AgentId>,
        specialization: impl Into<String>,
        role: AgentRole,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            specialization: specialization.into(),
            role,
            partition: partition.into(),
            profile: AgentProfile::default(),
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = AgentProfile::new(profile);
        self
    }
}

/// Assembles a [`Swarm`] with its executor, consensus engine and roster.
pub struct SwarmBuilder {
    name: String,
    backend: Arc<dyn InferenceBackend>,
    strategy: ExecutionStrategy,
    settings: ExecutorSettings,
    engine: ConsensusEngine,
    prompts: Option<Arc<dyn AgentPromptBuilder>>,
    variant: Option<SwarmVariant>,
    variant_profile: AgentProfile,
    agents: Vec<AgentSpec>,
    default_algorithm: ConsensusAlgorithm,
    history_window: usize,
    event_bus: Option<EventBus>,
}

impl SwarmBuilder {
    pub fn new(name: impl Into<String>, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            name: name.into(),
            backend,
            strategy: ExecutionStrategy::default(),
            settings: ExecutorSettings::default(),
            engine: ConsensusEngine::new(),
            prompts: None,
            variant: None,
            variant_profile: AgentProfile::default(),
            agents: Vec::new(),
            default_algorithm: ConsensusAlgorithm::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
            event_bus: None,
        }
    }

    /// Builder pre-populated from the `spec.swarm` section of a manifest.
    pub fn from_settings(
        name: impl Into<String>,
        backend: Arc<dyn InferenceBackend>,
        settings: &SwarmSettings,
    ) -> Result<Self, SwarmError> {
        let mut builder = Self::new(name, backend)
            .strategy(ExecutionStrategy::builtin(&settings.strategy)?)
            .default_algorithm(settings.default_algorithm.parse()?)
            .history_window(settings.history_window)
            .executor_settings(ExecutorSettings {
                agent_timeout: settings.agent_timeout,
                partition_quotas: settings.partition_quotas.clone(),
                ..Default::default()
            });

        if let Some(variant) = &settings.variant {
            builder = builder.variant(variant.parse()?);
        }

        for entry in &settings.agents {
            builder = builder.agent(
                AgentSpec::new(
                    entry.id.as_str(),
                    entry.specialization.clone(),
                    entry.role.parse()?,
                    entry.partition.clone(),
                )
                .with_profile(entry.profile.clone()),
            );
        }

        Ok(builder)
    }

    pub fn strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn executor_settings(mut self, settings: ExecutorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn consensus_engine(mut self, engine: ConsensusEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Overrides the variant's prompt builder, if any.
    pub fn prompt_builder(mut self, prompts: Arc<dyn AgentPromptBuilder>) -> Self {
        self.prompts = Some(prompts);
        self
    }

    pub fn variant(mut self, variant: SwarmVariant) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Profile given to agents of the variant roster.
    pub fn variant_profile(mut self, profile: impl Into<String>) -> Self {
        self.variant_profile = AgentProfile::new(profile);
        self
    }

    pub fn agent(mut self, spec: AgentSpec) -> Self {
        self.agents.push(spec);
        self
    }

    pub fn default_algorithm(mut self, algorithm: ConsensusAlgorithm) -> Self {
        self.default_algorithm = algorithm;
        self
    }

    pub fn history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn build(self) -> Result<Swarm, SwarmError> {
        let executor = ParallelExecutor::new(self.backend, self.strategy, self.settings)?;
        let prompts: Arc<dyn AgentPromptBuilder> = match (self.prompts, self.variant) {
            (Some(prompts), _) => prompts,
            (None, Some(variant)) => Arc::new(variant.prompt_builder()),
            (None, None) => Arc::new(DefaultPromptBuilder::new()),
        };

        let mut swarm = Swarm::new(self.name, executor, self.engine, prompts)
            .with_default_algorithm(self.default_algorithm)
            .with_history_window(self.history_window);
        if let Some(bus) = self.event_bus {
            swarm = swarm.with_event_bus(bus);
        }

        if let Some(variant) = self.variant {
            for slot in variant.roster() {
                swarm.add_agent_with_profile(
                    slot.id,
                    slot.specialization,
                    slot.role,
                    slot.partition,
                    self.variant_profile.clone(),
                )?;
            }
        }
        for spec in self.agents {
            swarm.add_agent_with_profile(
                spec.id,
                spec.specialization,
                spec.role,
                spec.partition,
                spec.profile,
            )?;
        }

        info!(
            swarm = %swarm.name,
            swarm_id = %swarm.id,
            agents = swarm.roster.len(),
            strategy = %swarm.strategy().name,
            "Swarm assembled"
        );
        Ok(swarm)
    }
}
