//! Workflow template management.
//!
//! CRUD over the template store plus bounds-checked step and transition
//! edits. Templates are configuration: edits here never touch tasks, and
//! structural validation is advisory so half-built pipelines can be
//! assembled incrementally.

use std::sync::Arc;

use tracing::info;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{TemplateDefect, Transition, WorkflowStep, WorkflowTemplate};
use crate::domain::ports::{ContractRegistry, TemplateRepository};

pub struct TemplateService<W, R> {
    templates: Arc<W>,
    registry: Arc<R>,
}

impl<W, R> TemplateService<W, R>
where
    W: TemplateRepository,
    R: ContractRegistry,
{
    pub fn new(templates: Arc<W>, registry: Arc<R>) -> Self {
        Self {
            templates,
            registry,
        }
    }

    pub async fn create(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> EngineResult<WorkflowTemplate> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::Configuration(
                "template name cannot be empty".to_string(),
            ));
        }
        let template = WorkflowTemplate::new(name, description);
        self.templates.create(&template).await?;
        info!(template = %template.name, "template created");
        Ok(template)
    }

    pub async fn get(&self, name: &str) -> EngineResult<WorkflowTemplate> {
        self.templates
            .get(name)
            .await?
            .ok_or_else(|| EngineError::TemplateNotFound(name.to_string()))
    }

    pub async fn list(&self) -> EngineResult<Vec<WorkflowTemplate>> {
        self.templates.list().await
    }

    pub async fn delete(&self, name: &str) -> EngineResult<()> {
        self.templates.delete(name).await?;
        info!(template = name, "template deleted");
        Ok(())
    }

    /// Insert a step at `index`, or append when `index` is `None`.
    pub async fn add_step(
        &self,
        name: &str,
        index: Option<usize>,
        step: WorkflowStep,
    ) -> EngineResult<WorkflowTemplate> {
        let mut template = self.get(name).await?;
        let at = index.unwrap_or(template.steps.len());
        if at > template.steps.len() {
            return Err(EngineError::StepNotFound {
                template: name.to_string(),
                index: at,
            });
        }
        template.steps.insert(at, step);
        self.templates.update(&template).await?;
        Ok(template)
    }

    pub async fn remove_step(&self, name: &str, index: usize) -> EngineResult<WorkflowTemplate> {
        let mut template = self.get(name).await?;
        if index >= template.steps.len() {
            return Err(EngineError::StepNotFound {
                template: name.to_string(),
                index,
            });
        }
        template.steps.remove(index);
        self.templates.update(&template).await?;
        Ok(template)
    }

    pub async fn step(&self, name: &str, index: usize) -> EngineResult<WorkflowStep> {
        let template = self.get(name).await?;
        template
            .step(index)
            .cloned()
            .ok_or_else(|| EngineError::StepNotFound {
                template: name.to_string(),
                index,
            })
    }

    pub async fn add_transition(
        &self,
        name: &str,
        index: usize,
        status: impl Into<String>,
        transition: Transition,
    ) -> EngineResult<WorkflowTemplate> {
        let mut template = self.get(name).await?;
        let step = template
            .steps
            .get_mut(index)
            .ok_or_else(|| EngineError::StepNotFound {
                template: name.to_string(),
                index,
            })?;
        step.on_status.insert(status.into(), transition);
        self.templates.update(&template).await?;
        Ok(template)
    }

    pub async fn remove_transition(
        &self,
        name: &str,
        index: usize,
        status: &str,
    ) -> EngineResult<WorkflowTemplate> {
        let mut template = self.get(name).await?;
        let step = template
            .steps
            .get_mut(index)
            .ok_or_else(|| EngineError::StepNotFound {
                template: name.to_string(),
                index,
            })?;
        if step.on_status.remove(status).is_none() {
            return Err(EngineError::TransitionNotFound {
                template: name.to_string(),
                step: index,
                status: status.to_string(),
            });
        }
        self.templates.update(&template).await?;
        Ok(template)
    }

    /// Collect every structural defect in a template: unregistered agents,
    /// blank inputs or outputs, and transitions routing to agents that are
    /// not steps of the template.
    pub async fn validate(&self, name: &str) -> EngineResult<Vec<TemplateDefect>> {
        let template = self.get(name).await?;
        let mut defects = Vec::new();
        if template.steps.is_empty() {
            defects.push(TemplateDefect {
                step: None,
                message: "template has no steps".to_string(),
            });
        }
        for (i, step) in template.steps.iter().enumerate() {
            if !self.registry.contains(&step.agent_id) {
                defects.push(TemplateDefect {
                    step: Some(i),
                    message: format!("agent '{}' is not registered", step.agent_id),
                });
            }
            if step.input.trim().is_empty() {
                defects.push(TemplateDefect {
                    step: Some(i),
                    message: "input pattern is empty".to_string(),
                });
            }
            if step.required_output.trim().is_empty() {
                defects.push(TemplateDefect {
                    step: Some(i),
                    message: "required output is empty".to_string(),
                });
            }
            for (status, transition) in &step.on_status {
                if let Some(agent) = &transition.next_step {
                    if template.find_step_for_agent(agent, 0).is_none() {
                        defects.push(TemplateDefect {
                            step: Some(i),
                            message: format!(
                                "transition '{status}' routes to '{agent}', which is not a step"
                            ),
                        });
                    }
                }
            }
        }
        Ok(defects)
    }
}
