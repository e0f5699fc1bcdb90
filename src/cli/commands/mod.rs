//! Command handlers, one module per command group.

pub mod agent;
pub mod chain;
pub mod init;
pub mod outputs;
pub mod task;
pub mod template;
