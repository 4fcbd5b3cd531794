// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Specialized swarm variants.
//!
//! Each variant is configuration only: a fixed roster and a prompt builder
//! that puts variant instructions in front of the default template.

use crate::application::prompt::{AgentPromptBuilder, DefaultPromptBuilder};
use crate::domain::agent::{Agent, AgentRole};
use crate::domain::error::SwarmError;
use crate::domain::task::SwarmTask;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwarmVariant {
    IntentClassification,
    DataAnalysis,
    ModelBuilding,
    SolutionValidation,
}

/// A fixed roster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterSlot {
    pub id: &'static str,
    pub specialization: &'static str,
    pub role: AgentRole,
    pub partition: &'static str,
}

const fn slot(
    id: &'static str,
    specialization: &'static str,
    role: AgentRole,
    partition: &'static str,
) -> RosterSlot {
    RosterSlot {
        id,
        specialization,
        role,
        partition,
    }
}

const INTENT_ROSTER: &[RosterSlot] = &[
    slot("intent-ops", "operations research", AgentRole::Classifier, "us-east-1"),
    slot("intent-domain", "business domain", AgentRole::Classifier, "us-west-2"),
    slot("intent-data", "data requirements", AgentRole::Classifier, "eu-west-1"),
    slot("intent-cost", "cost optimization", AgentRole::Classifier, "us-east-1"),
    slot("intent-risk", "risk assessment", AgentRole::Classifier, "us-west-2"),
];

const DATA_ROSTER: &[RosterSlot] = &[
    slot("data-quality", "data quality", AgentRole::Analyzer, "us-east-1"),
    slot("data-stats", "statistical analysis", AgentRole::Analyzer, "us-west-2"),
    slot("data-constraints", "constraint discovery", AgentRole::Analyzer, "eu-west-1"),
    slot("data-features", "feature engineering", AgentRole::Analyzer, "us-east-1"),
];

const MODEL_ROSTER: &[RosterSlot] = &[
    slot("model-lp", "linear programming", AgentRole::Modeler, "us-east-1"),
    slot("model-mip", "mixed-integer programming", AgentRole::Modeler, "us-west-2"),
    slot("model-nonlinear", "nonlinear optimization", AgentRole::Modeler, "eu-west-1"),
    slot("model-solver", "solver selection", AgentRole::Optimizer, "us-east-1"),
];

const VALIDATION_ROSTER: &[RosterSlot] = &[
    slot("validate-feasibility", "feasibility checking", AgentRole::Validator, "us-east-1"),
    slot("validate-business", "business rule review", AgentRole::Validator, "us-west-2"),
    slot("validate-sensitivity", "sensitivity analysis", AgentRole::Validator, "eu-west-1"),
    slot("validate-robustness", "robustness testing", AgentRole::Validator, "us-east-1"),
];

impl SwarmVariant {
    pub const ALL: [SwarmVariant; 4] = [
        SwarmVariant::IntentClassification,
        SwarmVariant::DataAnalysis,
        SwarmVariant::ModelBuilding,
        SwarmVariant::SolutionValidation,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SwarmVariant::IntentClassification => "intent_classification",
            SwarmVariant::DataAnalysis => "data_analysis",
            SwarmVariant::ModelBuilding => "model_building",
            SwarmVariant::SolutionValidation => "solution_validation",
        }
    }

    pub fn roster(&self) -> &'static [RosterSlot] {
        match self {
            SwarmVariant::IntentClassification => INTENT_ROSTER,
            SwarmVariant::DataAnalysis => DATA_ROSTER,
            SwarmVariant::ModelBuilding => MODEL_ROSTER,
            SwarmVariant::SolutionValidation => VALIDATION_ROSTER,
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            SwarmVariant::IntentClassification => {
                "Classify the optimization intent behind the request. \
                 Answer with the problem class (for example production_planning, \
                 scheduling, routing, portfolio or resource_allocation)."
            }
            SwarmVariant::DataAnalysis => {
                "Review the supplied data for the optimization problem. \
                 Report entities, variables, constraints and data gaps."
            }
            SwarmVariant::ModelBuilding => {
                "Recommend a mathematical model for the problem: model type, \
                 decision variables, objective and constraints, plus a suitable solver."
            }
            SwarmVariant::SolutionValidation => {
                "Assess whether the proposed solution is feasible and sound. \
                 Answer with valid or invalid and list any violated constraints."
            }
        }
    }

    pub fn prompt_builder(&self) -> VariantPromptBuilder {
        VariantPromptBuilder {
            variant: *self,
            inner: DefaultPromptBuilder::new(),
        }
    }
}

impl fmt::Display for SwarmVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SwarmVariant {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|v| v.name() == normalized)
            .ok_or_else(|| SwarmError::UnknownVariant(s.to_string()))
    }
}

pub struct VariantPromptBuilder {
    variant: SwarmVariant,
    inner: DefaultPromptBuilder,
}

impl AgentPromptBuilder for VariantPromptBuilder {
    fn create_agent_prompt(&self, agent: &Agent, task: &SwarmTask) -> String {
        let instructions = format!(
            "{} Focus on the {} perspective.",
            self.variant.instructions(),
            agent.specialization
        );
        self.inner.render(agent, task, Some(&instructions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentId, AgentProfile};
    use serde_json::json;
    use std::collections::BTreeSet;

    #[test]
    fn test_variant_names_round_trip() {
        for variant in SwarmVariant::ALL {
            assert_eq!(variant.name().parse::<SwarmVariant>().unwrap(), variant);
        }
        assert_eq!(
            "Model-Building".parse::<SwarmVariant>().unwrap(),
            SwarmVariant::ModelBuilding
        );
        assert!(matches!(
            "forecasting".parse::<SwarmVariant>(),
            Err(SwarmError::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_rosters_have_unique_ids() {
        for variant in SwarmVariant::ALL {
            let ids: BTreeSet<_> = variant.roster().iter().map(|s| s.id).collect();
            assert_eq!(ids.len(), variant.roster().len(), "{}", variant);
        }
        assert_eq!(SwarmVariant::IntentClassification.roster().len(), 5);
    }

    #[test]
    fn test_variant_prompt_carries_instructions() {
        let slot = SwarmVariant::ModelBuilding.roster()[0];
        let agent = Agent::new(
            AgentId::from(slot.id),
            slot.specialization,
            slot.role,
            slot.partition,
            AgentProfile::default(),
            10,
        );
        let task = SwarmTask::new("model_building", json!({"goal": "minimize cost"}));
        let prompt = SwarmVariant::ModelBuilding
            .prompt_builder()
            .create_agent_prompt(&agent, &task);

        assert!(prompt.contains("Recommend a mathematical model"));
        assert!(prompt.contains("linear programming perspective"));
        assert!(prompt.contains("minimize cost"));
    }
}
