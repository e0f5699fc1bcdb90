//! Domain errors for the baton task engine.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::TaskStatus;

/// Domain-level errors that can occur in the baton engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Agent not registered: {0}")]
    AgentNotFound(String),

    #[error("Workflow template not found: {0}")]
    TemplateNotFound(String),

    #[error("Step {index} not found in template '{template}'")]
    StepNotFound { template: String, index: usize },

    #[error("Cannot {operation} task {task}: status is {status}")]
    InvalidState {
        task: Uuid,
        status: TaskStatus,
        operation: &'static str,
    },

    #[error("Output validation failed for agent '{agent}': missing {}", .missing.join(", "))]
    ValidationFailed { agent: String, missing: Vec<String> },

    #[error("Source artifact does not exist: {0}")]
    SourceMissing(String),

    #[error("Successor input does not exist: {0}")]
    NextSourceMissing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("No transition for status '{status}' at step {step} of template '{template}'")]
    TransitionNotFound {
        template: String,
        step: usize,
        status: String,
    },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Agent invocation failed: {0}")]
    Invoker(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Io(err.to_string())
    }
}
