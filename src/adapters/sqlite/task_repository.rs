//! SQLite implementation of the `TaskRepository`.
//!
//! Status changes are applied as guarded single-statement updates inside a
//! transaction that also maintains the agent-status side table, so two
//! concurrent invocations can never move the same task twice or observe a
//! task in two collections.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    AgentActivity, AgentState, Task, TaskPriority, TaskStatus,
};
use crate::domain::ports::{StatusChange, TaskFilter, TaskRepository};

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> EngineResult<()> {
        let metadata_json = serde_json::to_string(&task.metadata)?;

        sqlx::query(
            r#"INSERT INTO tasks (id, title, agent_id, priority, task_type, description,
               source, status, result, auto_complete, auto_chain, metadata,
               created_at, started_at, completed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(task.id.to_string())
        .bind(&task.title)
        .bind(&task.agent_id)
        .bind(task.priority.as_str())
        .bind(&task.task_type)
        .bind(&task.description)
        .bind(&task.source)
        .bind(task.status.as_str())
        .bind(&task.result)
        .bind(i32::from(task.auto_complete))
        .bind(i32::from(task.auto_chain))
        .bind(&metadata_json)
        .bind(task.created_at.to_rfc3339())
        .bind(task.started_at.map(|t| t.to_rfc3339()))
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> EngineResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self, filter: TaskFilter) -> EngineResult<Vec<Task>> {
        let mut query = String::from("SELECT * FROM tasks WHERE 1=1");
        let mut bindings: Vec<String> = Vec::new();

        if let Some(status) = &filter.status {
            query.push_str(" AND status = ?");
            bindings.push(status.as_str().to_string());
        }
        if let Some(agent_id) = &filter.agent_id {
            query.push_str(" AND agent_id = ?");
            bindings.push(agent_id.clone());
        }
        if let Some(priority) = &filter.priority {
            query.push_str(" AND priority = ?");
            bindings.push(priority.as_str().to_string());
        }
        if let Some(enhancement) = &filter.enhancement {
            query.push_str(" AND json_extract(metadata, '$.enhancement') = ?");
            bindings.push(enhancement.clone());
        }

        query.push_str(" ORDER BY created_at DESC");
        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        let mut q = sqlx::query_as::<_, TaskRow>(&query);
        for binding in &bindings {
            q = q.bind(binding);
        }

        let rows: Vec<TaskRow> = q.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn counts_by_status(&self) -> EngineResult<HashMap<TaskStatus, u64>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM tasks GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = HashMap::new();
        for (status_str, count) in rows {
            if let Some(status) = TaskStatus::from_str(&status_str) {
                counts.insert(status, count as u64);
            }
        }
        Ok(counts)
    }

    async fn transition(&self, id: Uuid, change: StatusChange) -> EngineResult<Task> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let affected = match &change {
            StatusChange::Start => {
                sqlx::query(
                    "UPDATE tasks SET status = 'active', started_at = ?
                     WHERE id = ? AND status = 'pending'",
                )
                .bind(now.to_rfc3339())
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected()
            }
            StatusChange::Complete { result } => {
                sqlx::query(
                    "UPDATE tasks SET status = 'completed', completed_at = ?, result = ?
                     WHERE id = ? AND status = 'active'",
                )
                .bind(now.to_rfc3339())
                .bind(result)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected()
            }
            StatusChange::Fail { reason } => {
                sqlx::query(
                    "UPDATE tasks SET status = 'failed', completed_at = ?, result = ?
                     WHERE id = ? AND status = 'active'",
                )
                .bind(now.to_rfc3339())
                .bind(reason)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected()
            }
            StatusChange::Cancel { reason } => {
                sqlx::query(
                    "UPDATE tasks SET status = 'cancelled', completed_at = ?, result = ?
                     WHERE id = ? AND status IN ('pending', 'active')",
                )
                .bind(now.to_rfc3339())
                .bind(reason)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?
                .rows_affected()
            }
        };

        if affected == 0 {
            // The guard did not match: distinguish a missing task from a
            // task sitting in the wrong collection.
            let current: Option<(String,)> =
                sqlx::query_as("SELECT status FROM tasks WHERE id = ?")
                    .bind(id.to_string())
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;

            return match current {
                None => Err(EngineError::TaskNotFound(id)),
                Some((status_str,)) => {
                    let status = TaskStatus::from_str(&status_str)
                        .ok_or_else(|| EngineError::Database(format!(
                            "Invalid status in store: {status_str}"
                        )))?;
                    Err(EngineError::InvalidState {
                        task: id,
                        status,
                        operation: change.operation(),
                    })
                }
            };
        }

        let row: TaskRow = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&mut *tx)
            .await?;
        let task: Task = row.try_into()?;

        match &change {
            StatusChange::Start => {
                sqlx::query(
                    "INSERT INTO agent_status (agent_id, state, current_task, updated_at)
                     VALUES (?, 'active', ?, ?)
                     ON CONFLICT(agent_id) DO UPDATE SET
                         state = 'active', current_task = excluded.current_task,
                         updated_at = excluded.updated_at",
                )
                .bind(&task.agent_id)
                .bind(id.to_string())
                .bind(now.to_rfc3339())
                .execute(&mut *tx)
                .await?;
            }
            StatusChange::Complete { .. } | StatusChange::Fail { .. } => {
                sqlx::query(
                    "UPDATE agent_status SET state = 'idle', current_task = NULL, updated_at = ?
                     WHERE agent_id = ?",
                )
                .bind(now.to_rfc3339())
                .bind(&task.agent_id)
                .execute(&mut *tx)
                .await?;
            }
            StatusChange::Cancel { .. } => {
                // Only reset the agent if it was working on this task;
                // cancelling a pending task leaves the side table alone.
                sqlx::query(
                    "UPDATE agent_status SET state = 'idle', current_task = NULL, updated_at = ?
                     WHERE agent_id = ? AND current_task = ?",
                )
                .bind(now.to_rfc3339())
                .bind(&task.agent_id)
                .bind(id.to_string())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(task)
    }

    async fn annotate(&self, id: Uuid, entries: &[(String, String)]) -> EngineResult<Task> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> = sqlx::query_as("SELECT metadata FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let Some((metadata_json,)) = row else {
            tx.rollback().await?;
            return Err(EngineError::TaskNotFound(id));
        };

        let mut metadata: BTreeMap<String, String> = serde_json::from_str(&metadata_json)?;
        for (key, value) in entries {
            metadata.insert(key.clone(), value.clone());
        }

        sqlx::query("UPDATE tasks SET metadata = ? WHERE id = ?")
            .bind(serde_json::to_string(&metadata)?)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        let row: TaskRow = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn agent_states(&self) -> EngineResult<Vec<AgentState>> {
        let rows: Vec<AgentStateRow> =
            sqlx::query_as("SELECT * FROM agent_status ORDER BY agent_id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn agent_state(&self, agent_id: &str) -> EngineResult<Option<AgentState>> {
        let row: Option<AgentStateRow> =
            sqlx::query_as("SELECT * FROM agent_status WHERE agent_id = ?")
                .bind(agent_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    agent_id: String,
    priority: String,
    task_type: String,
    description: String,
    source: Option<String>,
    status: String,
    result: Option<String>,
    auto_complete: i32,
    auto_chain: i32,
    metadata: String,
    created_at: String,
    started_at: Option<String>,
    completed_at: Option<String>,
}

impl TryFrom<TaskRow> for Task {
    type Error = EngineError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| EngineError::Serialization(e.to_string()))?;

        let status = TaskStatus::from_str(&row.status)
            .ok_or_else(|| EngineError::Serialization(format!("Invalid status: {}", row.status)))?;

        let priority = TaskPriority::from_str(&row.priority).ok_or_else(|| {
            EngineError::Serialization(format!("Invalid priority: {}", row.priority))
        })?;

        let metadata: BTreeMap<String, String> = serde_json::from_str(&row.metadata)?;

        let created_at = parse_timestamp(&row.created_at)?;
        let started_at = row.started_at.as_deref().map(parse_timestamp).transpose()?;
        let completed_at = row.completed_at.as_deref().map(parse_timestamp).transpose()?;

        Ok(Task {
            id,
            title: row.title,
            agent_id: row.agent_id,
            priority,
            task_type: row.task_type,
            description: row.description,
            source: row.source,
            status,
            result: row.result,
            auto_complete: row.auto_complete != 0,
            auto_chain: row.auto_chain != 0,
            metadata,
            created_at,
            started_at,
            completed_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AgentStateRow {
    agent_id: String,
    state: String,
    current_task: Option<String>,
    updated_at: String,
}

impl TryFrom<AgentStateRow> for AgentState {
    type Error = EngineError;

    fn try_from(row: AgentStateRow) -> Result<Self, Self::Error> {
        let activity = AgentActivity::from_str(&row.state).ok_or_else(|| {
            EngineError::Serialization(format!("Invalid agent state: {}", row.state))
        })?;
        let current_task = row
            .current_task
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| EngineError::Serialization(e.to_string()))?;

        Ok(AgentState {
            agent_id: row.agent_id,
            activity,
            current_task,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<chrono::DateTime<chrono::Utc>, EngineError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&chrono::Utc))
        .map_err(|e| EngineError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{all_embedded_migrations, create_test_pool, Migrator};

    async fn setup_test_repo() -> SqliteTaskRepository {
        let pool = create_test_pool().await.unwrap();
        let migrator = Migrator::new(pool.clone());
        migrator
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        SqliteTaskRepository::new(pool)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = setup_test_repo().await;
        let task = Task::new("Analyze", "requirements-analyst")
            .with_source("spec.md")
            .with_automation(true, true);

        repo.insert(&task).await.unwrap();

        let retrieved = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(retrieved, task);
    }

    #[tokio::test]
    async fn test_transition_start_marks_agent_active() {
        let repo = setup_test_repo().await;
        let task = Task::new("Analyze", "requirements-analyst");
        repo.insert(&task).await.unwrap();

        let started = repo.transition(task.id, StatusChange::Start).await.unwrap();
        assert_eq!(started.status, TaskStatus::Active);
        assert!(started.started_at.is_some());

        let state = repo.agent_state("requirements-analyst").await.unwrap().unwrap();
        assert_eq!(state.activity, AgentActivity::Active);
        assert_eq!(state.current_task, Some(task.id));
    }

    #[tokio::test]
    async fn test_transition_guard_rejects_wrong_collection() {
        let repo = setup_test_repo().await;
        let task = Task::new("Analyze", "requirements-analyst");
        repo.insert(&task).await.unwrap();

        let err = repo
            .transition(
                task.id,
                StatusChange::Complete {
                    result: "DONE".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidState { .. }));

        // The guard must not have moved the task.
        let unchanged = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_transition_unknown_task() {
        let repo = setup_test_repo().await;
        let err = repo
            .transition(Uuid::new_v4(), StatusChange::Start)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_complete_resets_agent() {
        let repo = setup_test_repo().await;
        let task = Task::new("Analyze", "requirements-analyst");
        repo.insert(&task).await.unwrap();
        repo.transition(task.id, StatusChange::Start).await.unwrap();

        let done = repo
            .transition(
                task.id,
                StatusChange::Complete {
                    result: "READY_FOR_DEVELOPMENT".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.result.as_deref(), Some("READY_FOR_DEVELOPMENT"));
        assert!(done.completed_at.is_some());

        let state = repo.agent_state("requirements-analyst").await.unwrap().unwrap();
        assert_eq!(state.activity, AgentActivity::Idle);
        assert_eq!(state.current_task, None);
    }

    #[tokio::test]
    async fn test_cancel_pending_retains_record() {
        let repo = setup_test_repo().await;
        let task = Task::new("Analyze", "requirements-analyst");
        repo.insert(&task).await.unwrap();

        let cancelled = repo
            .transition(
                task.id,
                StatusChange::Cancel {
                    reason: "no longer needed".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);
        assert_eq!(cancelled.result.as_deref(), Some("no longer needed"));

        let pending = repo
            .list(TaskFilter {
                status: Some(TaskStatus::Pending),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn test_annotate_merges_metadata() {
        let repo = setup_test_repo().await;
        let task = Task::new("Analyze", "requirements-analyst").with_enhancement("login");
        repo.insert(&task).await.unwrap();

        let updated = repo
            .annotate(
                task.id,
                &[("invocation_ms".to_string(), "1200".to_string())],
            )
            .await
            .unwrap();
        assert_eq!(updated.metadata.get("invocation_ms").unwrap(), "1200");
        assert_eq!(updated.enhancement(), Some("login"));
    }

    #[tokio::test]
    async fn test_counts_and_filters() {
        let repo = setup_test_repo().await;
        let a = Task::new("A", "requirements-analyst").with_enhancement("login");
        let b = Task::new("B", "architect");
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();
        repo.transition(b.id, StatusChange::Start).await.unwrap();

        let counts = repo.counts_by_status().await.unwrap();
        assert_eq!(counts.get(&TaskStatus::Pending), Some(&1));
        assert_eq!(counts.get(&TaskStatus::Active), Some(&1));

        let by_enhancement = repo
            .list(TaskFilter {
                enhancement: Some("login".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_enhancement.len(), 1);
        assert_eq!(by_enhancement[0].id, a.id);
    }
}
