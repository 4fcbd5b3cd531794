// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Execution Strategies
//!
//! A strategy is a named, immutable bound on how many agents may be in
//! flight at once and how long to pause between batches. The built-in table
//! mirrors the quotas of typical hosted inference backends:
//!
//! | Name | Max parallel | Batch delay | Partition routing |
//! |------|--------------|-------------|-------------------|
//! | `parallel` | 10 | 0s | no |
//! | `batched` | 3 | 20s | no |
//! | `cross_partition` | 3 per partition | 20s | yes |
//! | `provisioned` | unlimited | 0s | no |

use crate::domain::error::SwarmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const PARALLEL: &str = "parallel";
pub const BATCHED: &str = "batched";
pub const CROSS_PARTITION: &str = "cross_partition";
pub const PROVISIONED: &str = "provisioned";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStrategy {
    pub name: String,
    pub max_parallel_requests: usize,
    #[serde(with = "humantime_serde")]
    pub delay_between_batches: Duration,
    pub use_partition_routing: bool,
    pub description: String,
}

impl ExecutionStrategy {
    /// Look up a strategy from the built-in table.
    pub fn builtin(name: &str) -> Result<Self, SwarmError> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::catalog()
            .into_iter()
            .find(|s| s.name == normalized)
            .ok_or_else(|| SwarmError::UnknownStrategy(name.to_string()))
    }

    pub fn catalog() -> Vec<Self> {
        vec![
            Self {
                name: PARALLEL.to_string(),
                max_parallel_requests: 10,
                delay_between_batches: Duration::ZERO,
                use_partition_routing: false,
                description: "Invoke every agent at once, up to 10 in flight".to_string(),
            },
            Self {
                name: BATCHED.to_string(),
                max_parallel_requests: 3,
                delay_between_batches: Duration::from_secs(20),
                use_partition_routing: false,
                description: "Batches of 3 with a 20s pause to stay under per-minute quotas"
                    .to_string(),
            },
            Self {
                name: CROSS_PARTITION.to_string(),
                max_parallel_requests: 3,
                delay_between_batches: Duration::from_secs(20),
                use_partition_routing: true,
                description: "Batches of 3 per partition; partitions have independent quotas"
                    .to_string(),
            },
            Self {
                name: PROVISIONED.to_string(),
                max_parallel_requests: usize::MAX,
                delay_between_batches: Duration::ZERO,
                use_partition_routing: false,
                description: "Provisioned throughput with no request ceiling".to_string(),
            },
        ]
    }

    pub fn validate(&self) -> Result<(), SwarmError> {
        if self.name.trim().is_empty() {
            return Err(SwarmError::InvalidStrategy {
                name: self.name.clone(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.max_parallel_requests == 0 {
            return Err(SwarmError::InvalidStrategy {
                name: self.name.clone(),
                reason: "max_parallel_requests must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Split agents (given by partition, in roster order) into batches of
    /// indices.
    ///
    /// Without partition routing every batch holds up to
    /// `max_parallel_requests` agents. With routing each batch admits up to
    /// that many agents from *each* partition, partitions taken in order of
    /// first appearance.
    pub fn plan_batches<S: AsRef<str>>(&self, partitions: &[S]) -> Vec<Vec<usize>> {
        let max = self.max_parallel_requests.max(1);
        let count = partitions.len();
        if count == 0 {
            return Vec::new();
        }

        if !self.use_partition_routing {
            if max >= count {
                return vec![(0..count).collect()];
            }
            let indices: Vec<usize> = (0..count).collect();
            return indices.chunks(max).map(<[usize]>::to_vec).collect();
        }

        let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
        for (index, partition) in partitions.iter().enumerate() {
            let partition = partition.as_ref();
            match groups.iter_mut().find(|(p, _)| *p == partition) {
                Some((_, members)) => members.push(index),
                None => groups.push((partition, vec![index])),
            }
        }

        let rounds = groups
            .iter()
            .map(|(_, members)| members.len().div_ceil(max))
            .max()
            .unwrap_or(0);

        (0..rounds)
            .map(|round| {
                groups
                    .iter()
                    .flat_map(|(_, members)| members.chunks(max).nth(round).unwrap_or(&[]))
                    .copied()
                    .collect()
            })
            .collect()
    }
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self {
            name: BATCHED.to_string(),
            max_parallel_requests: 3,
            delay_between_batches: Duration::from_secs(20),
            use_partition_routing: false,
            description: "Batches of 3 with a 20s pause to stay under per-minute quotas"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(batches: &[Vec<usize>]) -> Vec<usize> {
        batches.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_builtin_lookup() {
        let strategy = ExecutionStrategy::builtin("Cross-Partition").unwrap();
        assert!(strategy.use_partition_routing);
        assert_eq!(ExecutionStrategy::builtin("batched").unwrap(), ExecutionStrategy::default());
        assert!(matches!(
            ExecutionStrategy::builtin("turbo"),
            Err(SwarmError::UnknownStrategy(_))
        ));
        for strategy in ExecutionStrategy::catalog() {
            strategy.validate().unwrap();
        }
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let strategy = ExecutionStrategy {
            max_parallel_requests: 0,
            ..Default::default()
        };
        assert!(matches!(
            strategy.validate(),
            Err(SwarmError::InvalidStrategy { .. })
        ));
    }

    #[test]
    fn test_batches_of_three() {
        let strategy = ExecutionStrategy::default();
        let partitions = vec!["p"; 7];
        let batches = strategy.plan_batches(&partitions);
        assert_eq!(sizes(&batches), vec![3, 3, 1]);
        assert_eq!(batches.concat(), (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_single_batch_when_capacity_suffices() {
        let strategy = ExecutionStrategy::builtin(PROVISIONED).unwrap();
        let batches = strategy.plan_batches(&["a", "b", "c"]);
        assert_eq!(batches, vec![vec![0, 1, 2]]);
        assert!(strategy.plan_batches::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_partition_routing_batches_per_partition() {
        let strategy = ExecutionStrategy {
            max_parallel_requests: 2,
            use_partition_routing: true,
            ..Default::default()
        };
        // east: 0,2,4  west: 1,3  eu: 5
        let partitions = ["east", "west", "east", "west", "east", "eu"];
        let batches = strategy.plan_batches(&partitions);
        assert_eq!(batches, vec![vec![0, 2, 1, 3, 5], vec![4]]);
    }
}
