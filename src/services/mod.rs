//! Application services orchestrating the domain over the ports.

pub mod chainer;
pub mod output_validator;
pub mod runner;
pub mod task_service;
pub mod template_service;

pub use chainer::{ChainOutcome, Chainer, SuccessorResolver};
pub use output_validator::{OutputValidator, ValidationReport};
pub use runner::{RunReport, RunStatus, RunStep, TaskRunner};
pub use task_service::{QueueStatus, TaskService};
pub use template_service::TemplateService;
