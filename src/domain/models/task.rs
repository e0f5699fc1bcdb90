//! Task domain model.
//!
//! A task is one unit of delegated work assigned to a named agent. Tasks
//! move through a five-state lifecycle; the status column is the single
//! source of truth for which queue collection a task belongs to.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata key naming the enhancement a task's artifacts belong to.
pub const META_ENHANCEMENT: &str = "enhancement";
/// Metadata key binding a task to a workflow template.
pub const META_WORKFLOW: &str = "workflow";
/// Metadata key holding the zero-based step index within the bound template.
pub const META_WORKFLOW_STEP: &str = "workflow_step";
/// Metadata slot for identifiers returned by external issue trackers.
pub const META_EXTERNAL_REF: &str = "external_ref";
/// Metadata key recording the pid of a running agent invocation.
pub const META_INVOKER_PID: &str = "invoker_pid";

/// Status of a task in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is queued and has not been started
    Pending,
    /// Task is being executed by its agent
    Active,
    /// Task finished with a result status
    Completed,
    /// Task failed with a reason
    Failed,
    /// Task was cancelled before completion
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "active" | "running" => Some(Self::Active),
            "completed" | "complete" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" | "canceled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// All five queue collections, in display order.
    pub fn all() -> [TaskStatus; 5] {
        [
            Self::Pending,
            Self::Active,
            Self::Completed,
            Self::Failed,
            Self::Cancelled,
        ]
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Valid transitions from this status. Moving between collections is
    /// the only way a task's status ever changes.
    pub fn valid_transitions(&self) -> Vec<TaskStatus> {
        match self {
            Self::Pending => vec![Self::Active, Self::Cancelled],
            Self::Active => vec![Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed | Self::Failed | Self::Cancelled => vec![],
        }
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority level for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Normal
    }
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of delegated work assigned to a named agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable for the lifetime of the record
    pub id: Uuid,
    /// Human-readable title
    pub title: String,
    /// Agent responsible for executing the task
    pub agent_id: String,
    /// Priority
    pub priority: TaskPriority,
    /// Kind of work (analysis, design, development, testing, ...)
    pub task_type: String,
    /// Detailed description
    pub description: String,
    /// Input artifact path; absent for ad-hoc tasks
    pub source: Option<String>,
    /// Current queue collection
    pub status: TaskStatus,
    /// Terminal result status (completed) or reason (failed/cancelled)
    pub result: Option<String>,
    /// Complete automatically when the agent reports a recognized status
    pub auto_complete: bool,
    /// Derive and launch a successor task on completion
    pub auto_chain: bool,
    /// Open key/value annotations; the only field amendable after a task
    /// reaches a terminal collection
    pub metadata: BTreeMap<String, String>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When execution started
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal collection
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task for an agent.
    pub fn new(title: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            agent_id: agent_id.into(),
            priority: TaskPriority::default(),
            task_type: "general".to_string(),
            description: String::new(),
            source: None,
            status: TaskStatus::default(),
            result: None,
            auto_complete: false,
            auto_chain: false,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the task type.
    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the input artifact path.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the automation flags.
    pub fn with_automation(mut self, auto_complete: bool, auto_chain: bool) -> Self {
        self.auto_complete = auto_complete;
        self.auto_chain = auto_chain;
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Scope the task's artifacts to an enhancement.
    pub fn with_enhancement(self, enhancement: impl Into<String>) -> Self {
        self.with_metadata(META_ENHANCEMENT, enhancement)
    }

    /// Bind the task to a workflow template step.
    pub fn with_workflow_step(self, workflow: impl Into<String>, step: usize) -> Self {
        self.with_metadata(META_WORKFLOW, workflow)
            .with_metadata(META_WORKFLOW_STEP, step.to_string())
    }

    /// The enhancement this task's artifacts belong to, if scoped.
    pub fn enhancement(&self) -> Option<&str> {
        self.metadata.get(META_ENHANCEMENT).map(String::as_str)
    }

    /// Workflow template binding, when the task was instantiated from one.
    pub fn workflow_binding(&self) -> Option<(&str, usize)> {
        let name = self.metadata.get(META_WORKFLOW)?;
        let index = self.metadata.get(META_WORKFLOW_STEP)?.parse().ok()?;
        Some((name.as_str(), index))
    }

    /// Check if task is in a terminal collection.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Validate a task before insertion.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Task title cannot be empty".to_string());
        }
        if self.agent_id.trim().is_empty() {
            return Err("Task agent cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Whether an agent is currently working on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentActivity {
    Idle,
    Active,
}

impl AgentActivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "active" => Some(Self::Active),
            _ => None,
        }
    }
}

/// One row of the agent-status side table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub agent_id: String,
    pub activity: AgentActivity,
    pub current_task: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}
