//! Port for the opaque agent process boundary.
//!
//! The engine never interprets agent output beyond the terminal status
//! token; everything else in the transcript is opaque.

use async_trait::async_trait;

use crate::domain::errors::EngineResult;
use crate::domain::models::{Task, TaskOutcome};

/// A request to run an agent against a task.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// The task being executed.
    pub task: Task,
    /// Constructed prompt text. Prompt assembly happens outside the
    /// engine; this is whatever the caller built.
    pub prompt: String,
}

/// Result of one agent invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Raw transcript text.
    pub transcript: String,
    /// Terminal status, extracted by scanning the transcript from the end.
    pub outcome: TaskOutcome,
    /// Wall-clock duration of the invocation.
    pub duration_ms: u64,
    /// Pid of the agent process, when one was spawned.
    pub pid: Option<u32>,
}

/// Executes the opaque agent process for a task.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Run the agent to completion. Blocking: resolves only when the
    /// underlying process exits.
    async fn invoke(&self, request: InvocationRequest) -> EngineResult<Invocation>;
}
