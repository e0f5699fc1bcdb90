//! Domain ports (interfaces to adapters).

pub mod contract_registry;
pub mod invoker;
pub mod task_repository;
pub mod template_repository;

pub use contract_registry::ContractRegistry;
pub use invoker::{AgentInvoker, Invocation, InvocationRequest};
pub use task_repository::{StatusChange, TaskFilter, TaskRepository};
pub use template_repository::TemplateRepository;
