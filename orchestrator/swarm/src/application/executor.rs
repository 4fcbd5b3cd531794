// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Parallel Executor
//!
//! Invokes the inference backend for every agent under an
//! [`ExecutionStrategy`], honoring per-partition request quotas.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Fan a task out to agents, fan the results back in
//! - **Integration:** Swarm → ParallelExecutor → InferenceBackend
//!
//! # Contract
//!
//! The returned map holds exactly one [`AgentResult`] per agent passed in.
//! Backend errors, timeouts, cancellation, disabled agents, panicking
//! prompt builders and panicking units are all converted into
//! zero-confidence failure results; nothing crosses this boundary as an
//! error.
//!
//! Units run on a [`JoinSet`] owned by the call, so dropping the returned
//! future aborts every unit still in flight.

use crate::application::prompt::AgentPromptBuilder;
use crate::application::quota::PartitionQuota;
use crate::domain::agent::{Agent, AgentId, AgentProfile};
use crate::domain::inference::{InferenceBackend, InferenceError, InferenceResponse};
use crate::domain::result::{AgentErrorKind, AgentResult, AgentResults, ExecutionMetrics};
use crate::domain::strategy::ExecutionStrategy;
use crate::domain::error::SwarmError;
use crate::domain::task::SwarmTask;
use metrics::{counter, histogram};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on any worker pool, whatever the strategy asks for.
pub const MAX_POOL: usize = 256;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Applied to each backend call individually.
    pub agent_timeout: Duration,
    /// Requests per minute, keyed by partition. Partitions without an entry
    /// are not rate limited.
    pub partition_quotas: BTreeMap<String, u32>,
    /// Used when the backend does not report a confidence.
    pub default_confidence: f64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            agent_timeout: Duration::from_secs(30),
            partition_quotas: BTreeMap::new(),
            default_confidence: DEFAULT_CONFIDENCE,
        }
    }
}

/// Progress callbacks, invoked on the caller's task.
pub trait ExecutionObserver: Send + Sync {
    fn on_batch_dispatched(&self, _batch_index: usize, _agents: &[AgentId]) {}
    fn on_agent_finished(&self, _result: &AgentResult) {}
}

pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}

pub struct ParallelExecutor {
    backend: Arc<dyn InferenceBackend>,
    strategy: ExecutionStrategy,
    settings: ExecutorSettings,
    pool_size: usize,
    pool: Arc<Semaphore>,
    partition_pools: Mutex<HashMap<String, Arc<Semaphore>>>,
    limiters: HashMap<String, Arc<PartitionQuota>>,
}

impl ParallelExecutor {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        strategy: ExecutionStrategy,
        settings: ExecutorSettings,
    ) -> Result<Self, SwarmError> {
        strategy.validate()?;

        let mut limiters = HashMap::new();
        for (partition, per_minute) in &settings.partition_quotas {
            let per_minute = NonZeroU32::new(*per_minute).ok_or_else(|| {
                SwarmError::Config(format!("Quota for partition '{}' must be non-zero", partition))
            })?;
            limiters.insert(partition.clone(), Arc::new(PartitionQuota::per_minute(per_minute)));
        }

        let pool_size = strategy.max_parallel_requests.min(MAX_POOL);
        info!(
            strategy = %strategy.name,
            pool_size,
            partition_routing = strategy.use_partition_routing,
            quotas = limiters.len(),
            "Parallel executor initialized"
        );

        Ok(Self {
            backend,
            strategy,
            settings,
            pool_size,
            pool: Arc::new(Semaphore::new(pool_size)),
            partition_pools: Mutex::new(HashMap::new()),
            limiters,
        })
    }

    pub fn strategy(&self) -> &ExecutionStrategy {
        &self.strategy
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Invoke every agent for `task` and collect one result per agent.
    pub async fn execute_agents_parallel(
        &self,
        agents: &[Agent],
        task: &SwarmTask,
        prompts: &dyn AgentPromptBuilder,
        cancel: &CancellationToken,
        observer: &dyn ExecutionObserver,
    ) -> AgentResults {
        let partitions: Vec<&str> = agents.iter().map(|a| a.partition.as_str()).collect();
        let batches = self.strategy.plan_batches(&partitions);
        let batch_count = batches.len();
        let mut results = AgentResults::new();

        for (index, batch) in batches.into_iter().enumerate() {
            if index > 0 && !self.strategy.delay_between_batches.is_zero() {
                debug!(
                    delay = ?self.strategy.delay_between_batches,
                    next_batch = index + 1,
                    "Pausing between batches"
                );
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.strategy.delay_between_batches) => {}
                }
            }

            let members: Vec<&Agent> = batch.iter().map(|&i| &agents[i]).collect();
            let ids: Vec<AgentId> = members.iter().map(|a| a.id.clone()).collect();
            info!(
                task_id = %task.task_id,
                batch = index + 1,
                batches = batch_count,
                size = members.len(),
                "Dispatching batch"
            );
            counter!("optiswarm_batches_dispatched_total", "strategy" => self.strategy.name.clone())
                .increment(1);
            observer.on_batch_dispatched(index, &ids);

            for result in self.run_batch(&members, task, prompts, cancel).await {
                observer.on_agent_finished(&result);
                results.insert(result.agent_id.clone(), result);
            }
        }

        results
    }

    async fn run_batch(
        &self,
        members: &[&Agent],
        task: &SwarmTask,
        prompts: &dyn AgentPromptBuilder,
        cancel: &CancellationToken,
    ) -> Vec<AgentResult> {
        let mut finished = Vec::with_capacity(members.len());
        let mut units = JoinSet::new();
        let mut owners: HashMap<Id, &Agent> = HashMap::with_capacity(members.len());

        for &agent in members {
            if !agent.is_active() {
                debug!(agent_id = %agent.id, "Skipping disabled agent");
                finished.push(AgentResult::failure(
                    agent.id.clone(),
                    agent.specialization.clone(),
                    agent.partition.clone(),
                    "Agent is disabled",
                    AgentErrorKind::AgentDisabled,
                    ExecutionMetrics::default(),
                ));
                continue;
            }

            let prompt =
                match catch_unwind(AssertUnwindSafe(|| prompts.create_agent_prompt(agent, task))) {
                    Ok(prompt) => prompt,
                    Err(_) => {
                        finished.push(panicked(agent, "Prompt builder panicked".to_string()));
                        continue;
                    }
                };

            let unit = Invocation {
                backend: self.backend.clone(),
                agent_id: agent.id.clone(),
                specialization: agent.specialization.clone(),
                partition: agent.partition.clone(),
                profile: agent.profile.clone(),
                prompt,
                context: task.context.clone(),
                pool: self.pool_for(&agent.partition),
                limiter: self.limiters.get(&agent.partition).cloned(),
                timeout: self.settings.agent_timeout,
                default_confidence: self.settings.default_confidence,
                cancel: cancel.clone(),
            };
            let handle = units.spawn(unit.run());
            owners.insert(handle.id(), agent);
        }

        while let Some(joined) = units.join_next_with_id().await {
            match joined {
                Ok((_, result)) => finished.push(result),
                Err(e) => {
                    if let Some(agent) = owners.get(&e.id()) {
                        finished.push(panicked(agent, format!("Agent task aborted: {}", e)));
                    }
                }
            }
        }

        finished
    }

    fn pool_for(&self, partition: &str) -> Arc<Semaphore> {
        if !self.strategy.use_partition_routing {
            return self.pool.clone();
        }
        self.partition_pools
            .lock()
            .entry(partition.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.pool_size)))
            .clone()
    }
}

fn panicked(agent: &Agent, error: String) -> AgentResult {
    warn!(agent_id = %agent.id, "{}", error);
    counter!(
        "optiswarm_agent_invocations_total",
        "partition" => agent.partition.clone(),
        "outcome" => AgentErrorKind::Panicked.as_str()
    )
    .increment(1);
    AgentResult::failure(
        agent.id.clone(),
        agent.specialization.clone(),
        agent.partition.clone(),
        error,
        AgentErrorKind::Panicked,
        ExecutionMetrics::default(),
    )
}

/// One agent's unit of work. Owns everything it needs so it can run on
/// its own task.
struct Invocation {
    backend: Arc<dyn InferenceBackend>,
    agent_id: AgentId,
    specialization: String,
    partition: String,
    profile: AgentProfile,
    prompt: String,
    context: BTreeMap<String, Value>,
    pool: Arc<Semaphore>,
    limiter: Option<Arc<PartitionQuota>>,
    timeout: Duration,
    default_confidence: f64,
    cancel: CancellationToken,
}

impl Invocation {
    async fn run(self) -> AgentResult {
        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(InferenceError::Cancelled),
            outcome = self.invoke() => outcome,
        };
        let elapsed = started.elapsed();

        histogram!("optiswarm_agent_latency_seconds", "partition" => self.partition.clone())
            .record(elapsed.as_secs_f64());

        let mut metrics = ExecutionMetrics {
            execution_time_ms: elapsed.as_millis() as u64,
            ..Default::default()
        };

        match outcome {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    metrics.tokens = Some(usage.tokens);
                    metrics.cost = Some(usage.cost);
                }
                let confidence = response.confidence.unwrap_or(self.default_confidence);
                counter!(
                    "optiswarm_agent_invocations_total",
                    "partition" => self.partition.clone(),
                    "outcome" => "success"
                )
                .increment(1);
                debug!(
                    agent_id = %self.agent_id,
                    confidence,
                    elapsed_ms = metrics.execution_time_ms,
                    "Agent completed"
                );
                AgentResult::success(
                    self.agent_id,
                    self.specialization,
                    self.partition,
                    response.result,
                    confidence,
                    metrics,
                )
            }
            Err(e) => {
                let kind = e.kind();
                counter!(
                    "optiswarm_agent_invocations_total",
                    "partition" => self.partition.clone(),
                    "outcome" => kind.as_str()
                )
                .increment(1);
                warn!(agent_id = %self.agent_id, error_kind = %kind, "Agent failed: {}", e);
                AgentResult::failure(
                    self.agent_id,
                    self.specialization,
                    self.partition,
                    e.to_string(),
                    kind,
                    metrics,
                )
            }
        }
    }

    async fn invoke(&self) -> Result<InferenceResponse, InferenceError> {
        let _permit = self
            .pool
            .acquire()
            .await
            .map_err(|_| InferenceError::Invocation("Worker pool closed".to_string()))?;

        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }

        match tokio::time::timeout(
            self.timeout,
            self.backend.invoke(&self.prompt, &self.context, &self.profile),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(InferenceError::Timeout(self.timeout)),
        }
    }
}
