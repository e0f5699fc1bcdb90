//! Mock invoker for tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::TaskOutcome;
use crate::domain::ports::{AgentInvoker, Invocation, InvocationRequest};

/// Scripted response for a mock invocation.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// Transcript the fake agent "produced".
    pub transcript: String,
    /// Simulate a process-level failure instead of returning a transcript.
    pub fail: Option<String>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            transcript: "Task handled.\nREADY_FOR_DEVELOPMENT".to_string(),
            fail: None,
        }
    }
}

impl MockResponse {
    pub fn transcript(text: impl Into<String>) -> Self {
        Self {
            transcript: text.into(),
            fail: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            transcript: String::new(),
            fail: Some(error.into()),
        }
    }
}

/// Mock invoker with a default response and per-task overrides.
#[derive(Clone, Default)]
pub struct MockInvoker {
    default_response: MockResponse,
    overrides: Arc<RwLock<HashMap<Uuid, MockResponse>>>,
    invoked: Arc<RwLock<Vec<Uuid>>>,
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_response(response: MockResponse) -> Self {
        Self {
            default_response: response,
            overrides: Arc::new(RwLock::new(HashMap::new())),
            invoked: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Script a response for a specific task id.
    pub async fn set_response_for_task(&self, task_id: Uuid, response: MockResponse) {
        self.overrides.write().await.insert(task_id, response);
    }

    /// Task ids invoked so far, in order.
    pub async fn invoked_tasks(&self) -> Vec<Uuid> {
        self.invoked.read().await.clone()
    }
}

#[async_trait]
impl AgentInvoker for MockInvoker {
    async fn invoke(&self, request: InvocationRequest) -> EngineResult<Invocation> {
        self.invoked.write().await.push(request.task.id);

        let response = self
            .overrides
            .read()
            .await
            .get(&request.task.id)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone());

        if let Some(error) = response.fail {
            return Err(EngineError::Invoker(error));
        }

        let outcome = TaskOutcome::scan_transcript(&response.transcript);
        Ok(Invocation {
            transcript: response.transcript,
            outcome,
            duration_ms: 1,
            pid: None,
        })
    }
}
