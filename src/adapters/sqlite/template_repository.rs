//! SQLite implementation of the `TemplateRepository`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{WorkflowStep, WorkflowTemplate};
use crate::domain::ports::TemplateRepository;

#[derive(Clone)]
pub struct SqliteTemplateRepository {
    pool: SqlitePool,
}

impl SqliteTemplateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for SqliteTemplateRepository {
    async fn create(&self, template: &WorkflowTemplate) -> EngineResult<()> {
        let steps_json = serde_json::to_string(&template.steps)?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT OR IGNORE INTO workflow_templates (id, name, description, steps, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(template.id.to_string())
        .bind(&template.name)
        .bind(&template.description)
        .bind(&steps_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::Configuration(format!(
                "Workflow template '{}' already exists",
                template.name
            )));
        }
        Ok(())
    }

    async fn get(&self, name: &str) -> EngineResult<Option<WorkflowTemplate>> {
        let row: Option<TemplateRow> =
            sqlx::query_as("SELECT * FROM workflow_templates WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn list(&self) -> EngineResult<Vec<WorkflowTemplate>> {
        let rows: Vec<TemplateRow> =
            sqlx::query_as("SELECT * FROM workflow_templates ORDER BY name")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update(&self, template: &WorkflowTemplate) -> EngineResult<()> {
        let steps_json = serde_json::to_string(&template.steps)?;

        let result = sqlx::query(
            "UPDATE workflow_templates SET description = ?, steps = ?, updated_at = ?
             WHERE name = ?",
        )
        .bind(&template.description)
        .bind(&steps_json)
        .bind(Utc::now().to_rfc3339())
        .bind(&template.name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::TemplateNotFound(template.name.clone()));
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> EngineResult<()> {
        let result = sqlx::query("DELETE FROM workflow_templates WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(EngineError::TemplateNotFound(name.to_string()));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: String,
    name: String,
    description: String,
    steps: String,
}

impl TryFrom<TemplateRow> for WorkflowTemplate {
    type Error = EngineError;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| EngineError::Serialization(e.to_string()))?;
        let steps: Vec<WorkflowStep> = serde_json::from_str(&row.steps)?;

        Ok(WorkflowTemplate {
            id,
            name: row.name,
            description: row.description,
            steps,
        })
    }
}
