//! Subprocess agent invoker.
//!
//! Runs the configured agent command with the constructed prompt, captures
//! the transcript from stdout, and extracts the terminal status token. The
//! spawned pid is reported so callers can record it for out-of-band
//! cancellation; the engine itself imposes no timeout.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{InvokerConfig, TaskOutcome};
use crate::domain::ports::{AgentInvoker, Invocation, InvocationRequest};

pub struct ProcessInvoker {
    config: InvokerConfig,
}

impl ProcessInvoker {
    pub fn new(config: InvokerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AgentInvoker for ProcessInvoker {
    async fn invoke(&self, request: InvocationRequest) -> EngineResult<Invocation> {
        if self.config.command.trim().is_empty() {
            return Err(EngineError::Configuration(
                "invoker.command is not configured".to_string(),
            ));
        }

        info!(
            task = %request.task.id,
            agent = %request.task.agent_id,
            command = %self.config.command,
            "invoking agent"
        );

        let start = Instant::now();
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg(&request.prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .map_err(|e| EngineError::Invoker(format!("spawn failed: {e}")))?;
        let pid = child.id();

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| EngineError::Invoker(format!("wait failed: {e}")))?;
        let duration_ms = start.elapsed().as_millis() as u64;

        // A process that exits non-zero explicitly errored; that is not the
        // same as finishing without a recognizable status token.
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Invoker(format!(
                "agent process exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).into_owned();
        let outcome = TaskOutcome::scan_transcript(&transcript);
        debug!(task = %request.task.id, ?outcome, duration_ms, "agent finished");

        Ok(Invocation {
            transcript,
            outcome,
            duration_ms,
            pid,
        })
    }
}

/// Best-effort termination of a recorded agent pid. Used by `task cancel`
/// when the task's metadata carries one; the store never auto-detects
/// process death.
#[cfg(unix)]
pub fn terminate_pid(pid: u32) -> EngineResult<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
        .map_err(|e| EngineError::Invoker(format!("cannot signal pid {pid}: {e}")))
}

#[cfg(not(unix))]
pub fn terminate_pid(pid: u32) -> EngineResult<()> {
    Err(EngineError::Invoker(format!(
        "terminating pid {pid} is not supported on this platform"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Task;

    fn request(prompt: &str) -> InvocationRequest {
        InvocationRequest {
            task: Task::new("T", "requirements-analyst"),
            prompt: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn test_echo_transcript_outcome() {
        // `echo` stands in for an agent that prints a status token.
        let invoker = ProcessInvoker::new(InvokerConfig {
            command: "echo".to_string(),
            args: vec![],
        });

        let invocation = invoker
            .invoke(request("analysis done READY_FOR_DEVELOPMENT"))
            .await
            .unwrap();
        assert_eq!(
            invocation.outcome,
            TaskOutcome::Ready {
                token: "READY_FOR_DEVELOPMENT".to_string()
            }
        );
        assert!(invocation.pid.is_some());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_invoker_error() {
        let invoker = ProcessInvoker::new(InvokerConfig {
            command: "false".to_string(),
            args: vec![],
        });
        let err = invoker.invoke(request("anything")).await.unwrap_err();
        assert!(matches!(err, EngineError::Invoker(_)));
    }

    #[tokio::test]
    async fn test_empty_command_is_configuration_error() {
        let invoker = ProcessInvoker::new(InvokerConfig {
            command: String::new(),
            args: vec![],
        });
        let err = invoker.invoke(request("anything")).await.unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
