//! Task lifecycle orchestration.
//!
//! Wraps the repository with the checks persistence cannot express:
//! contract resolution on admission and source artifact presence on
//! start. All status movement goes through the repository's guarded
//! transitions, so this layer never has to re-check collections.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{AgentState, Task, TaskStatus};
use crate::domain::ports::{ContractRegistry, StatusChange, TaskFilter, TaskRepository};

/// Queue-wide snapshot: per-collection counts plus the agent side table.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub counts: HashMap<TaskStatus, u64>,
    pub total: u64,
    pub agents: Vec<AgentState>,
}

pub struct TaskService<T, R> {
    tasks: Arc<T>,
    registry: Arc<R>,
}

impl<T, R> TaskService<T, R>
where
    T: TaskRepository,
    R: ContractRegistry,
{
    pub fn new(tasks: Arc<T>, registry: Arc<R>) -> Self {
        Self { tasks, registry }
    }

    /// Admit a new pending task. Rejects empty titles, blank agent ids and
    /// agents the contract registry does not know.
    pub async fn add(&self, task: Task) -> EngineResult<Task> {
        task.validate().map_err(EngineError::Configuration)?;
        if !self.registry.contains(&task.agent_id) {
            return Err(EngineError::AgentNotFound(task.agent_id.clone()));
        }
        self.tasks.insert(&task).await?;
        info!(task_id = %task.id, agent = %task.agent_id, "task added");
        Ok(task)
    }

    /// Move a pending task to active. The task's source artifact, when
    /// declared, must exist on disk before any state changes.
    pub async fn start(&self, id: Uuid) -> EngineResult<Task> {
        let task = self
            .tasks
            .get(id)
            .await?
            .ok_or(EngineError::TaskNotFound(id))?;
        if let Some(source) = &task.source {
            if !Path::new(source).exists() {
                return Err(EngineError::SourceMissing(source.clone()));
            }
        }
        let task = self.tasks.transition(id, StatusChange::Start).await?;
        info!(task_id = %id, agent = %task.agent_id, "task started");
        Ok(task)
    }

    /// Move an active task to completed, recording the result status verbatim.
    pub async fn complete(&self, id: Uuid, result: impl Into<String>) -> EngineResult<Task> {
        let result = result.into();
        let task = self
            .tasks
            .transition(id, StatusChange::Complete { result: result.clone() })
            .await?;
        info!(task_id = %id, result = %result, "task completed");
        Ok(task)
    }

    /// Move an active task to failed.
    pub async fn fail(&self, id: Uuid, reason: impl Into<String>) -> EngineResult<Task> {
        let reason = reason.into();
        let task = self
            .tasks
            .transition(id, StatusChange::Fail { reason: reason.clone() })
            .await?;
        info!(task_id = %id, reason = %reason, "task failed");
        Ok(task)
    }

    /// Cancel a pending or active task. The record is retained with the
    /// reason for audit; it never becomes invisible.
    pub async fn cancel(&self, id: Uuid, reason: impl Into<String>) -> EngineResult<Task> {
        let reason = reason.into();
        let task = self
            .tasks
            .transition(id, StatusChange::Cancel { reason: reason.clone() })
            .await?;
        info!(task_id = %id, reason = %reason, "task cancelled");
        Ok(task)
    }

    pub async fn get(&self, id: Uuid) -> EngineResult<Task> {
        self.tasks
            .get(id)
            .await?
            .ok_or(EngineError::TaskNotFound(id))
    }

    pub async fn list(&self, filter: TaskFilter) -> EngineResult<Vec<Task>> {
        self.tasks.list(filter).await
    }

    /// Merge additive metadata entries into a task, terminal or not.
    pub async fn annotate(&self, id: Uuid, entries: &[(String, String)]) -> EngineResult<Task> {
        debug!(task_id = %id, entries = entries.len(), "annotating task");
        self.tasks.annotate(id, entries).await
    }

    /// Per-collection counts plus agent activity, for status displays.
    pub async fn status(&self) -> EngineResult<QueueStatus> {
        let mut counts = self.tasks.counts_by_status().await?;
        for status in TaskStatus::all() {
            counts.entry(status).or_insert(0);
        }
        let total = counts.values().sum();
        let agents = self.tasks.agent_states().await?;
        Ok(QueueStatus {
            counts,
            total,
            agents,
        })
    }

    pub async fn agent_state(&self, agent_id: &str) -> EngineResult<Option<AgentState>> {
        self.tasks.agent_state(agent_id).await
    }
}
