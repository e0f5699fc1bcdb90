//! Drives tasks end to end: start, invoke, record, complete, chain.
//!
//! The runner is a loop rather than a recursive call so an arbitrarily
//! long auto-started chain runs in constant stack. Each iteration handles
//! exactly one task; the chainer decides whether there is a next one.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::EngineResult;
use crate::domain::models::{Task, META_INVOKER_PID};
use crate::domain::ports::{AgentInvoker, ContractRegistry, InvocationRequest, TaskRepository, TemplateRepository};
use crate::services::chainer::{ChainOutcome, Chainer};
use crate::services::task_service::TaskService;

/// Cost annotations recorded after every invocation.
pub const META_INVOCATION_MS: &str = "invocation_ms";
pub const META_TRANSCRIPT_BYTES: &str = "transcript_bytes";
pub const META_INVOKED_AT: &str = "invoked_at";

/// How one task's run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunStatus {
    /// Recognized status but `auto_complete` is off; the task stays
    /// active for an explicit complete.
    AwaitingCompletion { status: String },
    /// No recognized status in the transcript; the task stays active
    /// for an operator to resolve.
    ManualResolutionRequired,
    /// Completed with `auto_chain` off.
    Completed { status: String },
    /// Completed; the chain stopped on a non-chainable or undeclared status.
    ChainHalted { status: String },
    /// Completed; the workflow declared itself finished.
    WorkflowComplete,
    /// Completed; a successor was inserted but not auto-started.
    ChainedNotStarted { next_task: Uuid },
}

/// One executed task within a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStep {
    pub task_id: Uuid,
    pub agent_id: String,
    pub status: RunStatus,
}

/// Full trace of a run: every task executed, in order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub steps: Vec<RunStep>,
}

pub struct TaskRunner<T, W, R, I> {
    tasks: Arc<TaskService<T, R>>,
    chainer: Arc<Chainer<T, W, R>>,
    invoker: Arc<I>,
}

impl<T, W, R, I> TaskRunner<T, W, R, I>
where
    T: TaskRepository,
    W: TemplateRepository,
    R: ContractRegistry,
    I: AgentInvoker,
{
    pub fn new(
        tasks: Arc<TaskService<T, R>>,
        chainer: Arc<Chainer<T, W, R>>,
        invoker: Arc<I>,
    ) -> Self {
        Self {
            tasks,
            chainer,
            invoker,
        }
    }

    /// Run the pending task `id` and keep going for as long as completed
    /// tasks chain into auto-started successors.
    pub async fn run(&self, id: Uuid) -> EngineResult<RunReport> {
        let mut current = id;
        let mut steps = Vec::new();
        loop {
            let task = self.tasks.start(current).await?;
            let agent_id = task.agent_id.clone();
            let prompt = build_prompt(&task);
            let invocation = self
                .invoker
                .invoke(InvocationRequest { task: task.clone(), prompt })
                .await?;

            let mut entries = vec![
                (
                    META_INVOCATION_MS.to_string(),
                    invocation.duration_ms.to_string(),
                ),
                (
                    META_TRANSCRIPT_BYTES.to_string(),
                    invocation.transcript.len().to_string(),
                ),
                (META_INVOKED_AT.to_string(), Utc::now().to_rfc3339()),
            ];
            if let Some(pid) = invocation.pid {
                entries.push((META_INVOKER_PID.to_string(), pid.to_string()));
            }
            self.tasks.annotate(current, &entries).await?;

            let Some(status) = invocation.outcome.status_string() else {
                warn!(task_id = %current, "no recognized status in transcript");
                steps.push(RunStep {
                    task_id: current,
                    agent_id,
                    status: RunStatus::ManualResolutionRequired,
                });
                break;
            };

            if !task.auto_complete {
                steps.push(RunStep {
                    task_id: current,
                    agent_id,
                    status: RunStatus::AwaitingCompletion { status },
                });
                break;
            }

            let completed = self.tasks.complete(current, &status).await?;
            if !completed.auto_chain {
                steps.push(RunStep {
                    task_id: current,
                    agent_id,
                    status: RunStatus::Completed { status },
                });
                break;
            }

            match self.chainer.auto_chain(current, &status).await? {
                ChainOutcome::Halted { status } => {
                    steps.push(RunStep {
                        task_id: current,
                        agent_id,
                        status: RunStatus::ChainHalted { status },
                    });
                    break;
                }
                ChainOutcome::WorkflowComplete => {
                    steps.push(RunStep {
                        task_id: current,
                        agent_id,
                        status: RunStatus::WorkflowComplete,
                    });
                    break;
                }
                ChainOutcome::Chained { task: next, auto_start } => {
                    if auto_start {
                        info!(task_id = %current, next_task = %next.id, "continuing chain");
                        steps.push(RunStep {
                            task_id: current,
                            agent_id,
                            status: RunStatus::Completed { status },
                        });
                        current = next.id;
                    } else {
                        steps.push(RunStep {
                            task_id: current,
                            agent_id,
                            status: RunStatus::ChainedNotStarted { next_task: next.id },
                        });
                        break;
                    }
                }
            }
        }
        Ok(RunReport { steps })
    }
}

/// Assemble the prompt text handed to the agent process.
fn build_prompt(task: &Task) -> String {
    let mut prompt = format!("# Task: {}\n\nAgent: {}\n", task.title, task.agent_id);
    if !task.description.is_empty() {
        prompt.push_str(&format!("\n{}\n", task.description));
    }
    if let Some(source) = &task.source {
        prompt.push_str(&format!("\nInput artifact: {source}\n"));
    }
    if let Some(enhancement) = task.enhancement() {
        prompt.push_str(&format!("Enhancement: {enhancement}\n"));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};

    use crate::adapters::invoker::{MockInvoker, MockResponse};
    use crate::adapters::registry::YamlContractRegistry;
    use crate::adapters::sqlite::{
        all_embedded_migrations, create_test_pool, Migrator, SqliteTaskRepository,
        SqliteTemplateRepository,
    };
    use crate::domain::models::TaskStatus;

    struct Fixture {
        tasks: Arc<TaskService<SqliteTaskRepository, YamlContractRegistry>>,
        invoker: Arc<MockInvoker>,
        runner: TaskRunner<
            SqliteTaskRepository,
            SqliteTemplateRepository,
            YamlContractRegistry,
            MockInvoker,
        >,
        _tmp: tempfile::TempDir,
        root: PathBuf,
    }

    async fn fixture() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        let registry = Arc::new(YamlContractRegistry::builtin());
        let tasks = Arc::new(TaskService::new(
            Arc::new(SqliteTaskRepository::new(pool.clone())),
            Arc::clone(&registry),
        ));
        let templates = Arc::new(SqliteTemplateRepository::new(pool));
        let chainer = Arc::new(Chainer::new(
            Arc::clone(&tasks),
            templates,
            registry,
            root.clone(),
        ));
        let invoker = Arc::new(MockInvoker::new());
        let runner = TaskRunner::new(Arc::clone(&tasks), chainer, Arc::clone(&invoker));
        Fixture {
            tasks,
            invoker,
            runner,
            _tmp: tmp,
            root,
        }
    }

    fn write_outputs(root: &Path, agent_dir: &str, doc: &str, status: &str) {
        let dir = root.join("login-rework").join(agent_dir);
        fs::create_dir_all(&dir).unwrap();
        let content = format!(
            "enhancement: login-rework\nagent: a\ntask_id: t\ntimestamp: 2026-08-01T10:00:00Z\nstatus: {status}\n---\nbody\n"
        );
        fs::write(dir.join(doc), content).unwrap();
    }

    #[tokio::test]
    async fn test_run_without_auto_complete_leaves_task_active() {
        let fx = fixture().await;
        let task = fx
            .tasks
            .add(Task::new("Analyse", "requirements-analyst").with_enhancement("login-rework"))
            .await
            .unwrap();

        let report = fx.runner.run(task.id).await.unwrap();
        assert_eq!(report.steps.len(), 1);
        assert!(matches!(
            report.steps[0].status,
            RunStatus::AwaitingCompletion { .. }
        ));

        let task = fx.tasks.get(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Active);
        assert!(task.metadata.contains_key(META_INVOCATION_MS));
        assert!(task.metadata.contains_key(META_TRANSCRIPT_BYTES));
    }

    #[tokio::test]
    async fn test_run_unrecognized_output_requires_manual_resolution() {
        let fx = fixture().await;
        let task = fx
            .tasks
            .add(
                Task::new("Analyse", "requirements-analyst")
                    .with_automation(true, true)
                    .with_enhancement("login-rework"),
            )
            .await
            .unwrap();
        fx.invoker
            .set_response_for_task(task.id, MockResponse::transcript("rambling, no status"))
            .await;

        let report = fx.runner.run(task.id).await.unwrap();
        assert!(matches!(
            report.steps[0].status,
            RunStatus::ManualResolutionRequired
        ));
        let task = fx.tasks.get(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Active);
    }

    #[tokio::test]
    async fn test_run_chains_through_auto_started_successor() {
        let fx = fixture().await;
        write_outputs(
            &fx.root,
            "analysis",
            "analysis_summary.md",
            "READY_FOR_DEVELOPMENT",
        );
        write_outputs(
            &fx.root,
            "design",
            "design_summary.md",
            "READY_FOR_IMPLEMENTATION",
        );

        let first = fx
            .tasks
            .add(
                Task::new("Analyse", "requirements-analyst")
                    .with_automation(true, true)
                    .with_enhancement("login-rework"),
            )
            .await
            .unwrap();
        // both tasks report READY_FOR_DEVELOPMENT via the default mock
        // response; the architect contract declares no transition for it,
        // so the chain runs exactly one hop and halts
        let report = fx.runner.run(first.id).await.unwrap();

        assert_eq!(report.steps.len(), 2);
        assert!(matches!(
            report.steps[0].status,
            RunStatus::Completed { .. }
        ));
        assert_eq!(report.steps[1].agent_id, "architect");

        let invoked = fx.invoker.invoked_tasks().await;
        assert_eq!(invoked.len(), 2);
        assert_eq!(invoked[0], first.id);
    }

    #[tokio::test]
    async fn test_run_blocked_status_halts_chain() {
        let fx = fixture().await;
        write_outputs(
            &fx.root,
            "analysis",
            "analysis_summary.md",
            "BLOCKED: missing access",
        );
        let task = fx
            .tasks
            .add(
                Task::new("Analyse", "requirements-analyst")
                    .with_automation(true, true)
                    .with_enhancement("login-rework"),
            )
            .await
            .unwrap();
        fx.invoker
            .set_response_for_task(
                task.id,
                MockResponse::transcript("work log\nBLOCKED: missing access"),
            )
            .await;

        let report = fx.runner.run(task.id).await.unwrap();
        assert!(matches!(
            &report.steps[0].status,
            RunStatus::ChainHalted { status } if status == "BLOCKED: missing access"
        ));
        let task = fx.tasks.get(task.id).await.unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.result.as_deref(), Some("BLOCKED: missing access"));
    }
}
