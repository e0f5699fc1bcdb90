//! Domain models.

pub mod config;
pub mod contract;
pub mod outcome;
pub mod task;
pub mod template;

pub use config::{Config, DatabaseConfig, InvokerConfig, LoggingConfig, WorkspaceConfig};
pub use contract::{role_to_task_type, AgentContract, StatusKind, StatusSpec, REQUIRED_METADATA_KEYS};
pub use outcome::{TaskOutcome, BLOCKED_PREFIX};
pub use task::{
    AgentActivity, AgentState, Task, TaskPriority, TaskStatus, META_ENHANCEMENT,
    META_EXTERNAL_REF, META_INVOKER_PID, META_WORKFLOW, META_WORKFLOW_STEP,
};
pub use template::{TemplateDefect, Transition, WorkflowStep, WorkflowTemplate};
