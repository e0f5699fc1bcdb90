//! Successor derivation for completed tasks.
//!
//! When a completed task carries a chainable status, the chainer gates on
//! output validation, resolves the successor agent, and inserts the next
//! pending task. Resolution is template-driven when the task is bound to
//! a workflow template step, contract-driven otherwise. Every abort path
//! leaves the queue untouched; the successor insert is the only mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{
    role_to_task_type, AgentContract, Task, TaskOutcome, TaskStatus, WorkflowTemplate,
};
use crate::domain::ports::{ContractRegistry, TaskRepository, TemplateRepository};
use crate::services::output_validator::OutputValidator;
use crate::services::task_service::TaskService;

/// Result of one chaining attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainOutcome {
    /// The status carries no transition; the chain stops here.
    Halted { status: String },
    /// A transition was found and it declares the workflow finished.
    WorkflowComplete,
    /// A successor task was inserted.
    Chained { task: Task, auto_start: bool },
}

/// A resolved successor, before task construction.
#[derive(Debug, Clone)]
pub struct NextStep {
    pub agent_id: String,
    /// Input pattern declared by a template step; `None` means the
    /// predecessor's root document is the successor's source.
    pub input: Option<String>,
    pub auto_start: bool,
    /// Workflow binding for the successor, when template-driven.
    pub binding: Option<(String, usize)>,
}

/// What a status token resolves to.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// No declared transition for this token.
    NoTransition,
    /// A declared transition with no successor.
    Terminal,
    Next(NextStep),
}

/// Maps a completed task's status token to a successor.
pub trait SuccessorResolver {
    fn resolve(&self, token: &str) -> EngineResult<Resolution>;
}

/// Resolves successors from the completed agent's contract statuses.
pub struct ContractResolver<'a> {
    contract: &'a AgentContract,
}

impl SuccessorResolver for ContractResolver<'_> {
    fn resolve(&self, token: &str) -> EngineResult<Resolution> {
        let Some(spec) = self.contract.status_spec(token) else {
            return Ok(Resolution::NoTransition);
        };
        Ok(match spec.next_agents.first() {
            None => Resolution::Terminal,
            Some(agent) => Resolution::Next(NextStep {
                agent_id: agent.clone(),
                input: None,
                auto_start: true,
                binding: None,
            }),
        })
    }
}

/// Resolves successors from the workflow template step the task is bound to.
pub struct TemplateResolver<'a> {
    template: &'a WorkflowTemplate,
    step_index: usize,
}

impl SuccessorResolver for TemplateResolver<'_> {
    fn resolve(&self, token: &str) -> EngineResult<Resolution> {
        let step = self
            .template
            .step(self.step_index)
            .ok_or_else(|| EngineError::StepNotFound {
                template: self.template.name.clone(),
                index: self.step_index,
            })?;
        let Some(transition) = step.on_status.get(token) else {
            return Ok(Resolution::NoTransition);
        };
        let Some(agent) = &transition.next_step else {
            return Ok(Resolution::Terminal);
        };
        let next_index = self
            .template
            .find_step_for_agent(agent, self.step_index + 1)
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "template '{}' routes '{}' to '{}', which is not one of its steps",
                    self.template.name, token, agent
                ))
            })?;
        Ok(Resolution::Next(NextStep {
            agent_id: agent.clone(),
            input: Some(self.template.steps[next_index].input.clone()),
            auto_start: transition.auto_start,
            binding: Some((self.template.name.clone(), next_index)),
        }))
    }
}

pub struct Chainer<T, W, R> {
    tasks: Arc<TaskService<T, R>>,
    templates: Arc<W>,
    registry: Arc<R>,
    validator: OutputValidator<R>,
    enhancements_root: PathBuf,
}

impl<T, W, R> Chainer<T, W, R>
where
    T: TaskRepository,
    W: TemplateRepository,
    R: ContractRegistry,
{
    pub fn new(
        tasks: Arc<TaskService<T, R>>,
        templates: Arc<W>,
        registry: Arc<R>,
        enhancements_root: impl Into<PathBuf>,
    ) -> Self {
        let validator = OutputValidator::new(Arc::clone(&registry));
        Self {
            tasks,
            templates,
            registry,
            validator,
            enhancements_root: enhancements_root.into(),
        }
    }

    /// Derive and insert the successor of a completed task.
    ///
    /// Aborts without mutating anything when the task is not completed,
    /// when its outputs fail contract validation, when the successor agent
    /// is unregistered, or when the successor's input artifact is absent.
    pub async fn auto_chain(&self, id: Uuid, result_status: &str) -> EngineResult<ChainOutcome> {
        let task = self.tasks.get(id).await?;
        if task.status != TaskStatus::Completed {
            return Err(EngineError::TaskNotFound(id));
        }
        let contract = self
            .registry
            .get(&task.agent_id)
            .ok_or_else(|| EngineError::AgentNotFound(task.agent_id.clone()))?;
        let enhancement = task
            .enhancement()
            .ok_or_else(|| {
                EngineError::Configuration(format!("task {id} has no enhancement scope"))
            })?
            .to_string();
        let enhancement_dir = self.enhancements_root.join(&enhancement);

        let report = self.validator.validate(&task.agent_id, &enhancement_dir)?;
        if !report.is_satisfied() {
            return Err(EngineError::ValidationFailed {
                agent: task.agent_id.clone(),
                missing: report.missing,
            });
        }

        let outcome = TaskOutcome::from_status(result_status);
        let Some(token) = outcome.token() else {
            warn!(task_id = %id, status = result_status, "status is not chainable");
            return Ok(ChainOutcome::Halted {
                status: result_status.to_string(),
            });
        };

        let resolution = match task.workflow_binding() {
            Some((name, index)) => {
                let template = self
                    .templates
                    .get(name)
                    .await?
                    .ok_or_else(|| EngineError::TemplateNotFound(name.to_string()))?;
                TemplateResolver {
                    template: &template,
                    step_index: index,
                }
                .resolve(token)?
            }
            None => ContractResolver {
                contract: &contract,
            }
            .resolve(token)?,
        };

        let next = match resolution {
            Resolution::NoTransition => {
                return Ok(ChainOutcome::Halted {
                    status: result_status.to_string(),
                })
            }
            Resolution::Terminal => {
                info!(task_id = %id, enhancement = %enhancement, "workflow complete");
                return Ok(ChainOutcome::WorkflowComplete);
            }
            Resolution::Next(next) => next,
        };

        let next_contract = self
            .registry
            .get(&next.agent_id)
            .ok_or_else(|| EngineError::AgentNotFound(next.agent_id.clone()))?;

        let previous_output = enhancement_dir.join(contract.root_document_path());
        let source = match &next.input {
            Some(pattern) => self.render_input(pattern, &enhancement, &previous_output),
            None => previous_output,
        };
        if !source.exists() {
            return Err(EngineError::NextSourceMissing(
                source.to_string_lossy().into_owned(),
            ));
        }

        let mut successor = Task::new(
            format!("{}: {}", next.agent_id, enhancement),
            next.agent_id.clone(),
        )
        .with_task_type(role_to_task_type(&next_contract.role))
        .with_priority(task.priority)
        .with_description(format!(
            "Continue enhancement '{}' after {} reported {}",
            enhancement, task.agent_id, token
        ))
        .with_source(source.to_string_lossy().into_owned())
        .with_automation(task.auto_complete, task.auto_chain)
        .with_enhancement(&enhancement);
        if let Some((workflow, step)) = next.binding {
            successor = successor.with_workflow_step(workflow, step);
        }

        let successor = self.tasks.add(successor).await?;
        info!(
            task_id = %id,
            next_task = %successor.id,
            next_agent = %successor.agent_id,
            "chained successor"
        );
        Ok(ChainOutcome::Chained {
            task: successor,
            auto_start: next.auto_start,
        })
    }

    /// Complete an active task with a raw result status and, when its
    /// `auto_chain` flag is set, immediately derive its successor. Manual
    /// completion and automatic completion trigger chaining the same way.
    pub async fn complete_and_chain(
        &self,
        id: Uuid,
        result: impl Into<String>,
    ) -> EngineResult<(Task, Option<ChainOutcome>)> {
        let result = result.into();
        let task = self.tasks.complete(id, result.clone()).await?;
        if !task.auto_chain {
            return Ok((task, None));
        }
        let outcome = self.auto_chain(id, &result).await?;
        Ok((task, Some(outcome)))
    }

    /// Render a template input pattern. Relative results are resolved
    /// against the enhancements root.
    fn render_input(&self, pattern: &str, enhancement: &str, previous_output: &Path) -> PathBuf {
        let rendered = pattern
            .replace("{enhancement}", enhancement)
            .replace("{previous_output}", &previous_output.to_string_lossy());
        let path = PathBuf::from(rendered);
        if path.is_relative() {
            self.enhancements_root.join(path)
        } else {
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;

    use crate::adapters::registry::YamlContractRegistry;
    use crate::adapters::sqlite::{
        all_embedded_migrations, create_test_pool, Migrator, SqliteTaskRepository,
        SqliteTemplateRepository,
    };
    use crate::domain::models::{Transition, WorkflowStep};

    struct Fixture {
        tasks: Arc<TaskService<SqliteTaskRepository, YamlContractRegistry>>,
        templates: Arc<SqliteTemplateRepository>,
        chainer: Chainer<SqliteTaskRepository, SqliteTemplateRepository, YamlContractRegistry>,
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
        let chainer = Chainer::new(
            Arc::clone(&tasks),
            Arc::clone(&templates),
            registry,
            root.clone(),
        );
        Fixture {
            tasks,
            templates,
            chainer,
            _tmp: tmp,
            root,
        }
    }

    const HEADER: &str = "enhancement: login-rework\nagent: requirements-analyst\ntask_id: t\ntimestamp: 2026-08-01T10:00:00Z\nstatus: READY_FOR_DEVELOPMENT\n---\nbody\n";

    fn write_analysis_outputs(root: &Path) {
        let dir = root.join("login-rework").join("analysis");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("analysis_summary.md"), HEADER).unwrap();
        fs::write(dir.join("requirements.md"), "reqs\n").unwrap();
    }

    async fn completed_analysis_task(fx: &Fixture) -> Task {
        let task = fx
            .tasks
            .add(
                Task::new("Analyse login rework", "requirements-analyst")
                    .with_automation(true, true)
                    .with_enhancement("login-rework"),
            )
            .await
            .unwrap();
        fx.tasks.start(task.id).await.unwrap();
        fx.tasks
            .complete(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_contract_driven_chain_inserts_successor() {
        let fx = fixture().await;
        write_analysis_outputs(&fx.root);
        let task = completed_analysis_task(&fx).await;

        let outcome = fx
            .chainer
            .auto_chain(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap();
        let ChainOutcome::Chained { task: next, auto_start } = outcome else {
            panic!("expected a chained successor");
        };
        assert!(auto_start);
        assert_eq!(next.agent_id, "architect");
        assert_eq!(next.task_type, "design");
        assert_eq!(next.status, TaskStatus::Pending);
        assert_eq!(next.enhancement(), Some("login-rework"));
        assert!(next.auto_complete && next.auto_chain);
        assert!(next.source.as_deref().unwrap().ends_with("analysis_summary.md"));
    }

    #[tokio::test]
    async fn test_validation_failure_blocks_chain() {
        let fx = fixture().await;
        let task = completed_analysis_task(&fx).await;

        let err = fx
            .chainer
            .auto_chain(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed { .. }));

        // no successor was inserted
        let all = fx.tasks.list(Default::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_blocked_status_halts() {
        let fx = fixture().await;
        write_analysis_outputs(&fx.root);
        let task = completed_analysis_task(&fx).await;

        let outcome = fx
            .chainer
            .auto_chain(task.id, "BLOCKED: waiting on credentials")
            .await
            .unwrap();
        assert!(matches!(outcome, ChainOutcome::Halted { .. }));
    }

    #[tokio::test]
    async fn test_non_completed_task_cannot_chain() {
        let fx = fixture().await;
        let task = fx
            .tasks
            .add(Task::new("Pending work", "requirements-analyst").with_enhancement("login-rework"))
            .await
            .unwrap();
        let err = fx
            .chainer
            .auto_chain(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TaskNotFound(_)));
    }

    #[tokio::test]
    async fn test_template_driven_chain_advances_binding() {
        let fx = fixture().await;
        write_analysis_outputs(&fx.root);

        let mut template = WorkflowTemplate::new("fast-track", "two-step pipeline");
        template.steps.push(WorkflowStep {
            agent_id: "requirements-analyst".to_string(),
            input: "{enhancement}/spec.md".to_string(),
            required_output: "analysis_summary.md".to_string(),
            on_status: BTreeMap::from([(
                "READY_FOR_DEVELOPMENT".to_string(),
                Transition::to_agent("developer"),
            )]),
        });
        template.steps.push(WorkflowStep {
            agent_id: "developer".to_string(),
            input: "{previous_output}".to_string(),
            required_output: "implementation_summary.md".to_string(),
            on_status: BTreeMap::from([(
                "READY_FOR_TESTING".to_string(),
                Transition::terminal(),
            )]),
        });
        fx.templates.create(&template).await.unwrap();

        let task = fx
            .tasks
            .add(
                Task::new("Analyse", "requirements-analyst")
                    .with_enhancement("login-rework")
                    .with_workflow_step("fast-track", 0),
            )
            .await
            .unwrap();
        fx.tasks.start(task.id).await.unwrap();
        fx.tasks
            .complete(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap();

        let outcome = fx
            .chainer
            .auto_chain(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap();
        let ChainOutcome::Chained { task: next, .. } = outcome else {
            panic!("expected a chained successor");
        };
        // template overrides the contract's architect route
        assert_eq!(next.agent_id, "developer");
        assert_eq!(next.workflow_binding(), Some(("fast-track", 1)));
        assert!(next.source.as_deref().unwrap().ends_with("analysis_summary.md"));
    }

    #[tokio::test]
    async fn test_manual_completion_chains_when_flagged() {
        let fx = fixture().await;
        write_analysis_outputs(&fx.root);
        let task = fx
            .tasks
            .add(
                Task::new("Analyse login rework", "requirements-analyst")
                    .with_automation(false, true)
                    .with_enhancement("login-rework"),
            )
            .await
            .unwrap();
        fx.tasks.start(task.id).await.unwrap();

        let (done, outcome) = fx
            .chainer
            .complete_and_chain(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        let Some(ChainOutcome::Chained { task: next, .. }) = outcome else {
            panic!("expected a chained successor");
        };
        assert_eq!(next.agent_id, "architect");
    }

    #[tokio::test]
    async fn test_manual_completion_without_flag_does_not_chain() {
        let fx = fixture().await;
        write_analysis_outputs(&fx.root);
        let task = fx
            .tasks
            .add(
                Task::new("Analyse login rework", "requirements-analyst")
                    .with_enhancement("login-rework"),
            )
            .await
            .unwrap();
        fx.tasks.start(task.id).await.unwrap();

        let (done, outcome) = fx
            .chainer
            .complete_and_chain(task.id, "READY_FOR_DEVELOPMENT")
            .await
            .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(outcome.is_none());
        let all = fx.tasks.list(Default::default()).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_terminal_status_completes_workflow() {
        let fx = fixture().await;
        let dir = fx.root.join("login-rework").join("testing");
        fs::create_dir_all(&dir).unwrap();
        let header = HEADER.replace("requirements-analyst", "tester");
        fs::write(dir.join("test_report.md"), header).unwrap();

        let task = fx
            .tasks
            .add(Task::new("Test", "tester").with_enhancement("login-rework"))
            .await
            .unwrap();
        fx.tasks.start(task.id).await.unwrap();
        fx.tasks.complete(task.id, "TESTING_COMPLETE").await.unwrap();

        let outcome = fx
            .chainer
            .auto_chain(task.id, "TESTING_COMPLETE")
            .await
            .unwrap();
        assert!(matches!(outcome, ChainOutcome::WorkflowComplete));
    }
}
