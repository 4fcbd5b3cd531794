// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Prompt Builders
//!
//! Renders the prompt each agent receives from its specialization, its role
//! and the task, using Handlebars.
//!
//! # Supported Placeholders
//!
//! - `{{specialization}}` - Agent specialization
//! - `{{role}}` - Agent role (`classifier`, `optimizer`, ...)
//! - `{{partition}}` - Resource partition the agent runs in
//! - `{{task_type}}` - Kind of judgment requested
//! - `{{payload}}` - Task payload, pretty-printed JSON
//! - `{{context}}` - Task context, pretty-printed JSON (omitted when empty)
//! - `{{instructions}}` - Extra instructions supplied by a swarm variant

use crate::domain::agent::Agent;
use crate::domain::task::SwarmTask;
use handlebars::{no_escape, Handlebars};
use serde::Serialize;
use tracing::warn;

/// Extension point for specialized swarms.
pub trait AgentPromptBuilder: Send + Sync {
    fn create_agent_prompt(&self, agent: &Agent, task: &SwarmTask) -> String;
}

pub const DEFAULT_TEMPLATE: &str = "\
You are a {{specialization}} acting as a {{role}} in a swarm of specialized agents.
{{#if instructions}}
{{instructions}}
{{/if}}
Task type: {{task_type}}

Input:
{{payload}}
{{#if context}}
Context:
{{context}}
{{/if}}
Respond with a single JSON object of the form
{\"value\": <your answer>, \"confidence\": <number between 0 and 1>, \"reasoning\": \"<short justification>\"}
";

#[derive(Serialize)]
struct PromptContext<'a> {
    specialization: &'a str,
    role: &'a str,
    partition: &'a str,
    task_type: &'a str,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

pub struct DefaultPromptBuilder {
    handlebars: Handlebars<'static>,
    template: String,
    instructions: Option<String>,
}

impl DefaultPromptBuilder {
    pub fn new() -> Self {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    pub fn with_template(template: impl Into<String>) -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(no_escape);
        Self {
            handlebars,
            template: template.into(),
            instructions: None,
        }
    }

    /// Instructions rendered ahead of the task.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Render the prompt for `agent`, with `instructions` overriding any set
    /// on the builder.
    pub fn render(&self, agent: &Agent, task: &SwarmTask, instructions: Option<&str>) -> String {
        let context = PromptContext {
            specialization: &agent.specialization,
            role: agent.role.as_str(),
            partition: &agent.partition,
            task_type: &task.task_type,
            payload: pretty(&task.payload),
            context: (!task.context.is_empty()).then(|| pretty(&task.context)),
            instructions: instructions.or(self.instructions.as_deref()),
        };

        match self.handlebars.render_template(&self.template, &context) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(agent_id = %agent.id, "Prompt template failed to render: {}", e);
                format!(
                    "You are a {} ({}). Task type: {}\nInput: {}\nRespond with JSON {{\"value\", \"confidence\", \"reasoning\"}}.",
                    context.specialization, context.role, context.task_type, context.payload
                )
            }
        }
    }
}

impl Default for DefaultPromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentPromptBuilder for DefaultPromptBuilder {
    fn create_agent_prompt(&self, agent: &Agent, task: &SwarmTask) -> String {
        self.render(agent, task, None)
    }
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
