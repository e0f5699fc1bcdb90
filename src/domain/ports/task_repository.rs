//! Repository port for task persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::EngineResult;
use crate::domain::models::{AgentState, Task, TaskPriority, TaskStatus};

/// Filters for querying tasks.
#[derive(Default, Debug, Clone)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub agent_id: Option<String>,
    pub priority: Option<TaskPriority>,
    pub enhancement: Option<String>,
    pub limit: Option<i64>,
}

/// A guarded status change. Each variant names the collections it may
/// legally move a task out of; the repository applies the change as a
/// single compare-and-swap so concurrent writers can never race a task
/// into two collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    /// pending → active; stamps `started_at`, marks the agent active.
    Start,
    /// active → completed; stamps `completed_at`, stores the result
    /// status verbatim, resets the agent to idle.
    Complete { result: String },
    /// active → failed; stamps `completed_at`, stores the reason,
    /// resets the agent to idle.
    Fail { reason: String },
    /// pending|active → cancelled; stores the reason for audit,
    /// resets the agent to idle if it was working on this task.
    Cancel { reason: String },
}

impl StatusChange {
    /// Collections this change may move a task out of.
    pub fn allowed_from(&self) -> &'static [TaskStatus] {
        match self {
            Self::Start => &[TaskStatus::Pending],
            Self::Complete { .. } | Self::Fail { .. } => &[TaskStatus::Active],
            Self::Cancel { .. } => &[TaskStatus::Pending, TaskStatus::Active],
        }
    }

    /// Collection this change moves a task into.
    pub fn target(&self) -> TaskStatus {
        match self {
            Self::Start => TaskStatus::Active,
            Self::Complete { .. } => TaskStatus::Completed,
            Self::Fail { .. } => TaskStatus::Failed,
            Self::Cancel { .. } => TaskStatus::Cancelled,
        }
    }

    /// Operation name used in `InvalidState` errors.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete { .. } => "complete",
            Self::Fail { .. } => "fail",
            Self::Cancel { .. } => "cancel",
        }
    }
}

/// Repository port for task and agent-status persistence.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new pending task.
    async fn insert(&self, task: &Task) -> EngineResult<()>;

    /// Get a task by id.
    async fn get(&self, id: Uuid) -> EngineResult<Option<Task>>;

    /// List tasks with optional filters.
    async fn list(&self, filter: TaskFilter) -> EngineResult<Vec<Task>>;

    /// Count tasks per status collection.
    async fn counts_by_status(&self) -> EngineResult<HashMap<TaskStatus, u64>>;

    /// Apply a guarded status change; the task row and the agent-status
    /// side table are updated in one transaction. Returns the task as it
    /// stands after the change.
    async fn transition(&self, id: Uuid, change: StatusChange) -> EngineResult<Task>;

    /// Merge additive metadata entries into a task. Legal in any
    /// collection; the only mutation terminal records accept.
    async fn annotate(&self, id: Uuid, entries: &[(String, String)]) -> EngineResult<Task>;

    /// All rows of the agent-status side table.
    async fn agent_states(&self) -> EngineResult<Vec<AgentState>>;

    /// The side-table row for one agent, if it has ever run a task.
    async fn agent_state(&self, agent_id: &str) -> EngineResult<Option<AgentState>>;
}
