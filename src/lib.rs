//! Baton - Agent task queue and workflow chaining engine
//!
//! Baton persists a queue of tasks delegated to external agents, validates
//! each agent's deliverables against a declared contract, and derives
//! successor tasks from status-triggered transitions so an enhancement moves
//! through an agent pipeline without manual shepherding.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, ports and the error taxonomy
//! - **Adapters Layer** (`adapters`): SQLite persistence, YAML contract
//!   registry, subprocess agent invoker
//! - **Service Layer** (`services`): Task lifecycle, output validation,
//!   chaining and the invocation runner
//! - **Infrastructure Layer** (`infrastructure`): Configuration loading
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use baton::cli::AppContext;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ctx = AppContext::load().await?;
//!     let status = ctx.tasks.status().await?;
//!     println!("{} task(s) tracked", status.total);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{EngineError, EngineResult};
pub use domain::models::{
    AgentContract, AgentState, Config, Task, TaskOutcome, TaskPriority, TaskStatus, Transition,
    WorkflowStep, WorkflowTemplate,
};
pub use domain::ports::{
    AgentInvoker, ContractRegistry, StatusChange, TaskFilter, TaskRepository, TemplateRepository,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ChainOutcome, Chainer, OutputValidator, TaskRunner, TaskService, TemplateService};
