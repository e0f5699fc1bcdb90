//! Implementation of the `baton template` command group.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::collections::BTreeMap;

use crate::cli::context::AppContext;
use crate::cli::output::{format_step_table, format_template_table};
use crate::domain::models::{Transition, WorkflowStep};

#[derive(Args, Debug)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateCommands,
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Create an empty workflow template
    Create {
        /// Template name (unique)
        name: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List templates
    List,

    /// Show a template and its steps
    Show {
        /// Template name
        name: String,
    },

    /// Delete a template
    Delete {
        /// Template name
        name: String,
    },

    /// Check a template for structural defects
    Validate {
        /// Template name
        name: String,
    },

    /// Insert a step (appends without --index)
    AddStep {
        /// Template name
        name: String,

        /// Agent executing the step
        #[arg(short, long)]
        agent: String,

        /// Input pattern ({enhancement} and {previous_output} placeholders)
        #[arg(short, long)]
        input: String,

        /// Artifact the step must produce
        #[arg(short, long)]
        required_output: String,

        /// Position to insert at (0-based)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Remove a step by index
    RemoveStep {
        /// Template name
        name: String,

        /// Step index (0-based)
        index: usize,
    },

    /// List a template's steps
    ListSteps {
        /// Template name
        name: String,
    },

    /// Show one step in full
    ShowStep {
        /// Template name
        name: String,

        /// Step index (0-based)
        index: usize,
    },

    /// Add a status transition to a step
    AddTransition {
        /// Template name
        name: String,

        /// Step index (0-based)
        index: usize,

        /// Status code triggering the transition
        status: String,

        /// Successor agent; omit for a terminal transition
        #[arg(short, long)]
        next_step: Option<String>,

        /// Chain automatically when this status is reported
        #[arg(long)]
        auto_chain: bool,

        /// Do not start the successor immediately
        #[arg(long)]
        no_auto_start: bool,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove a status transition from a step
    RemoveTransition {
        /// Template name
        name: String,

        /// Step index (0-based)
        index: usize,

        /// Status code
        status: String,
    },

    /// List a step's transitions
    ListTransitions {
        /// Template name
        name: String,

        /// Step index (0-based)
        index: usize,
    },
}

pub async fn execute(args: TemplateArgs, json: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    let templates = &ctx.templates;
    match args.command {
        TemplateCommands::Create { name, description } => {
            let template = templates
                .create(name, description)
                .await
                .context("Failed to create template")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&template)?);
            } else {
                println!("Template '{}' created.", template.name);
            }
            Ok(())
        }

        TemplateCommands::List => {
            let all = templates.list().await.context("Failed to list templates")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&all)?);
            } else if all.is_empty() {
                println!("No templates defined.");
            } else {
                println!("{}", format_template_table(&all));
            }
            Ok(())
        }

        TemplateCommands::Show { name } => {
            let template = templates.get(&name).await.context("Failed to load template")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&template)?);
            } else {
                println!("Template: {}", template.name);
                if !template.description.is_empty() {
                    println!("  Description: {}", template.description);
                }
                if template.steps.is_empty() {
                    println!("  (no steps)");
                } else {
                    println!("{}", format_step_table(&template.steps));
                }
            }
            Ok(())
        }

        TemplateCommands::Delete { name } => {
            templates
                .delete(&name)
                .await
                .context("Failed to delete template")?;
            if json {
                println!("{}", serde_json::json!({ "deleted": name }));
            } else {
                println!("Template '{name}' deleted.");
            }
            Ok(())
        }

        TemplateCommands::Validate { name } => {
            let defects = templates
                .validate(&name)
                .await
                .context("Failed to validate template")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&defects)?);
            } else if defects.is_empty() {
                println!("Template '{name}' is structurally valid.");
            } else {
                println!("Template '{name}' has {} defect(s):", defects.len());
                for defect in &defects {
                    println!("  - {defect}");
                }
            }
            if !defects.is_empty() {
                anyhow::bail!("{} defect(s) found", defects.len());
            }
            Ok(())
        }

        TemplateCommands::AddStep {
            name,
            agent,
            input,
            required_output,
            index,
        } => {
            let step = WorkflowStep {
                agent_id: agent,
                input,
                required_output,
                on_status: BTreeMap::new(),
            };
            let template = templates
                .add_step(&name, index, step)
                .await
                .context("Failed to add step")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&template)?);
            } else {
                println!(
                    "Step added; template '{}' now has {} step(s).",
                    name,
                    template.steps.len()
                );
            }
            Ok(())
        }

        TemplateCommands::RemoveStep { name, index } => {
            let template = templates
                .remove_step(&name, index)
                .await
                .context("Failed to remove step")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&template)?);
            } else {
                println!(
                    "Step {} removed; template '{}' now has {} step(s).",
                    index,
                    name,
                    template.steps.len()
                );
            }
            Ok(())
        }

        TemplateCommands::ListSteps { name } => {
            let template = templates.get(&name).await.context("Failed to load template")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&template.steps)?);
            } else if template.steps.is_empty() {
                println!("Template '{name}' has no steps.");
            } else {
                println!("{}", format_step_table(&template.steps));
            }
            Ok(())
        }

        TemplateCommands::ShowStep { name, index } => {
            let step = templates
                .step(&name, index)
                .await
                .context("Failed to load step")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&step)?);
            } else {
                println!("Step {index} of '{name}':");
                println!("  Agent: {}", step.agent_id);
                println!("  Input: {}", step.input);
                println!("  Required output: {}", step.required_output);
                if step.on_status.is_empty() {
                    println!("  (no transitions)");
                } else {
                    println!("  Transitions:");
                    for (status, transition) in &step.on_status {
                        print_transition(status, transition);
                    }
                }
            }
            Ok(())
        }

        TemplateCommands::AddTransition {
            name,
            index,
            status,
            next_step,
            auto_chain,
            no_auto_start,
            description,
        } => {
            let transition = Transition {
                next_step,
                auto_chain,
                auto_start: !no_auto_start,
                description,
            };
            templates
                .add_transition(&name, index, status.clone(), transition)
                .await
                .context("Failed to add transition")?;
            if json {
                println!("{}", serde_json::json!({ "added": status }));
            } else {
                println!("Transition for '{status}' added to step {index} of '{name}'.");
            }
            Ok(())
        }

        TemplateCommands::RemoveTransition {
            name,
            index,
            status,
        } => {
            templates
                .remove_transition(&name, index, &status)
                .await
                .context("Failed to remove transition")?;
            if json {
                println!("{}", serde_json::json!({ "removed": status }));
            } else {
                println!("Transition for '{status}' removed from step {index} of '{name}'.");
            }
            Ok(())
        }

        TemplateCommands::ListTransitions { name, index } => {
            let step = templates
                .step(&name, index)
                .await
                .context("Failed to load step")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&step.on_status)?);
            } else if step.on_status.is_empty() {
                println!("Step {index} of '{name}' has no transitions.");
            } else {
                for (status, transition) in &step.on_status {
                    print_transition(status, transition);
                }
            }
            Ok(())
        }
    }
}

fn print_transition(status: &str, transition: &Transition) {
    let target = transition
        .next_step
        .as_deref()
        .unwrap_or("(end of workflow)");
    let mut flags = Vec::new();
    if transition.auto_chain {
        flags.push("auto_chain");
    }
    if transition.auto_start {
        flags.push("auto_start");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    println!("    {status} → {target}{flags}");
}
