//! Repository port for workflow template persistence.

use async_trait::async_trait;

use crate::domain::errors::EngineResult;
use crate::domain::models::WorkflowTemplate;

/// Repository port for workflow templates, keyed by unique name.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Insert a new template; the name must be unused.
    async fn create(&self, template: &WorkflowTemplate) -> EngineResult<()>;

    /// Get a template by name.
    async fn get(&self, name: &str) -> EngineResult<Option<WorkflowTemplate>>;

    /// List all templates ordered by name.
    async fn list(&self) -> EngineResult<Vec<WorkflowTemplate>>;

    /// Replace the stored steps/description of an existing template.
    async fn update(&self, template: &WorkflowTemplate) -> EngineResult<()>;

    /// Delete a template by name.
    async fn delete(&self, name: &str) -> EngineResult<()>;
}
