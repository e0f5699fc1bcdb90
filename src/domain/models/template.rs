//! Workflow template model.
//!
//! A template names an ordered sequence of steps; each step binds an agent,
//! an input pattern, a required output artifact, and a status→transition
//! map. Templates are configuration entities: the engine only reads them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_true() -> bool {
    true
}

/// What happens when a step finishes with a given status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Successor agent id; `None` ends the workflow normally.
    pub next_step: Option<String>,
    #[serde(default)]
    pub auto_chain: bool,
    /// Start the successor immediately after insertion.
    #[serde(default = "default_true")]
    pub auto_start: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transition {
    /// A terminal transition: the workflow ends here.
    pub fn terminal() -> Self {
        Self {
            next_step: None,
            auto_chain: false,
            auto_start: true,
            description: None,
        }
    }

    /// A transition to the named agent.
    pub fn to_agent(agent_id: impl Into<String>) -> Self {
        Self {
            next_step: Some(agent_id.into()),
            auto_chain: true,
            auto_start: true,
            description: None,
        }
    }
}

/// One step of a workflow template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Agent executing this step; must resolve in the contract registry.
    pub agent_id: String,
    /// Input pattern; `{enhancement}` and `{previous_output}` placeholders
    /// are resolved when the successor task is instantiated.
    pub input: String,
    /// Artifact this step must produce.
    pub required_output: String,
    /// Status code → transition map.
    #[serde(default)]
    pub on_status: BTreeMap<String, Transition>,
}

/// A named, ordered sequence of workflow steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: Uuid,
    /// Unique name; all engine lookups are by name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowTemplate {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(&self, index: usize) -> Option<&WorkflowStep> {
        self.steps.get(index)
    }

    /// Index of the first step bound to `agent_id` at or after `from`,
    /// falling back to a whole-template search.
    pub fn find_step_for_agent(&self, agent_id: &str, from: usize) -> Option<usize> {
        self.steps
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, s)| s.agent_id == agent_id)
            .or_else(|| {
                self.steps
                    .iter()
                    .enumerate()
                    .find(|(_, s)| s.agent_id == agent_id)
            })
            .map(|(i, _)| i)
    }
}

/// A structural defect found while validating a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateDefect {
    /// Step index the defect belongs to, if any.
    pub step: Option<usize>,
    pub message: String,
}

impl std::fmt::Display for TemplateDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.step {
            Some(i) => write!(f, "step {}: {}", i, self.message),
            None => f.write_str(&self.message),
        }
    }
}
