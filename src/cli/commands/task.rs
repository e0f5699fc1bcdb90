//! Implementation of the `baton task` command group.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::adapters::invoker::terminate_pid;
use crate::cli::context::AppContext;
use crate::cli::output::{format_agent_state_table, format_task_table};
use crate::domain::models::{Task, TaskPriority, TaskStatus, META_INVOKER_PID};
use crate::domain::ports::TaskFilter;
use crate::services::{ChainOutcome, RunReport, RunStatus};

#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Add a new pending task
    Add {
        /// Task title
        title: String,

        /// Agent responsible for the task
        #[arg(short, long)]
        agent: String,

        /// Task priority (critical|high|normal|low)
        #[arg(short, long, default_value = "normal")]
        priority: String,

        /// Kind of work (analysis, design, development, ...)
        #[arg(short = 't', long, default_value = "general")]
        task_type: String,

        /// Input artifact path
        #[arg(short, long)]
        source: Option<String>,

        /// Detailed description
        #[arg(short, long)]
        description: Option<String>,

        /// Enhancement this task's artifacts belong to
        #[arg(short, long)]
        enhancement: Option<String>,

        /// Complete automatically when the agent reports a recognized status
        #[arg(long)]
        auto_complete: bool,

        /// Derive and launch a successor task on completion
        #[arg(long)]
        auto_chain: bool,
    },

    /// Start a pending task and run its agent to completion
    Start {
        /// Task ID
        task_id: Uuid,
    },

    /// Complete an active task with a result status
    Complete {
        /// Task ID
        task_id: Uuid,

        /// Result status (for example READY_FOR_DEVELOPMENT)
        result: String,
    },

    /// Fail an active task
    Fail {
        /// Task ID
        task_id: Uuid,

        /// Failure reason
        reason: String,
    },

    /// Cancel a pending or active task
    Cancel {
        /// Task ID
        task_id: Uuid,

        /// Cancellation reason
        reason: String,
    },

    /// List tasks
    List {
        /// Filter by status (pending|active|completed|failed|cancelled)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by agent
        #[arg(short, long)]
        agent: Option<String>,

        /// Filter by enhancement
        #[arg(short, long)]
        enhancement: Option<String>,

        /// Maximum number of tasks to display
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },

    /// Show details for a specific task
    Show {
        /// Task ID
        task_id: Uuid,
    },

    /// Show queue status and agent activity
    Status,
}

pub async fn execute(args: TaskArgs, json: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    match args.command {
        TaskCommands::Add {
            title,
            agent,
            priority,
            task_type,
            source,
            description,
            enhancement,
            auto_complete,
            auto_chain,
        } => {
            let priority = TaskPriority::from_str(&priority)
                .ok_or_else(|| anyhow!("Unknown priority '{priority}'"))?;
            let mut task = Task::new(title, agent)
                .with_priority(priority)
                .with_task_type(task_type)
                .with_automation(auto_complete, auto_chain);
            if let Some(source) = source {
                task = task.with_source(source);
            }
            if let Some(description) = description {
                task = task.with_description(description);
            }
            if let Some(enhancement) = enhancement {
                task = task.with_enhancement(enhancement);
            }
            let task = ctx.tasks.add(task).await.context("Failed to add task")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                println!("Task added.");
                println!("  ID: {}", task.id);
                println!("  Agent: {}", task.agent_id);
                println!("  Priority: {}", task.priority);
                if task.auto_complete || task.auto_chain {
                    println!(
                        "  Automation: auto_complete={}, auto_chain={}",
                        task.auto_complete, task.auto_chain
                    );
                }
            }
            Ok(())
        }

        TaskCommands::Start { task_id } => {
            let report = ctx
                .runner
                .run(task_id)
                .await
                .context("Failed to run task")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_run_report(&report);
            }
            Ok(())
        }

        TaskCommands::Complete { task_id, result } => {
            let (task, outcome) = ctx
                .chainer
                .complete_and_chain(task_id, result)
                .await
                .context("Failed to complete task")?;
            let run = match &outcome {
                Some(ChainOutcome::Chained { task: next, auto_start }) if *auto_start => Some(
                    ctx.runner
                        .run(next.id)
                        .await
                        .context("Failed to run chained successor")?,
                ),
                _ => None,
            };

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "task": task,
                        "chain": outcome,
                        "run": run,
                    }))?
                );
                return Ok(());
            }
            print_task(&task, false, "Task completed.")?;
            match &outcome {
                None => {}
                Some(ChainOutcome::Halted { status }) => {
                    println!("  Chain: no transition for '{status}'.");
                }
                Some(ChainOutcome::WorkflowComplete) => {
                    println!("  Chain: workflow complete.");
                }
                Some(ChainOutcome::Chained { task: next, .. }) => {
                    println!("  Chain: successor {} for '{}'.", next.id, next.agent_id);
                    match &run {
                        Some(report) => {
                            println!("  {} run step(s) executed.", report.steps.len());
                        }
                        None => println!("  Successor not auto-started."),
                    }
                }
            }
            Ok(())
        }

        TaskCommands::Fail { task_id, reason } => {
            let task = ctx
                .tasks
                .fail(task_id, reason)
                .await
                .context("Failed to fail task")?;
            print_task(&task, json, "Task failed.")
        }

        TaskCommands::Cancel { task_id, reason } => {
            if let Ok(task) = ctx.tasks.get(task_id).await {
                signal_recorded_pid(&task);
            }
            let task = ctx
                .tasks
                .cancel(task_id, reason)
                .await
                .context("Failed to cancel task")?;
            print_task(&task, json, "Task cancelled.")
        }

        TaskCommands::List {
            status,
            agent,
            enhancement,
            limit,
        } => {
            let status = match status {
                Some(s) => Some(
                    TaskStatus::from_str(&s).ok_or_else(|| anyhow!("Unknown status '{s}'"))?,
                ),
                None => None,
            };
            let tasks = ctx
                .tasks
                .list(TaskFilter {
                    status,
                    agent_id: agent,
                    priority: None,
                    enhancement,
                    limit: Some(limit),
                })
                .await
                .context("Failed to list tasks")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks found.");
            } else {
                println!("{}", format_task_table(&tasks));
                println!("\nShowing {} task(s)", tasks.len());
            }
            Ok(())
        }

        TaskCommands::Show { task_id } => {
            let task = ctx
                .tasks
                .get(task_id)
                .await
                .context("Failed to retrieve task")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print_task_details(&task);
            }
            Ok(())
        }

        TaskCommands::Status => {
            let status = ctx.tasks.status().await.context("Failed to query status")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Queue status ({} task(s) total):", status.total);
                for task_status in TaskStatus::all() {
                    println!(
                        "  {}: {}",
                        task_status,
                        status.counts.get(&task_status).copied().unwrap_or(0)
                    );
                }
                if !status.agents.is_empty() {
                    println!("\nAgents:");
                    println!("{}", format_agent_state_table(&status.agents));
                }
            }
            Ok(())
        }
    }
}

/// Send SIGTERM to the invoker process recorded on an active task, if any.
/// Best effort: a stale or foreign pid must not block the cancel itself.
/// Returns whether a signal was attempted.
fn signal_recorded_pid(task: &Task) -> bool {
    if task.status != TaskStatus::Active {
        return false;
    }
    let Some(pid) = task
        .metadata
        .get(META_INVOKER_PID)
        .and_then(|p| p.parse::<u32>().ok())
    else {
        return false;
    };
    if let Err(err) = terminate_pid(pid) {
        tracing::warn!(task_id = %task.id, pid, %err, "could not signal invoker process");
    }
    true
}

fn print_task(task: &Task, json: bool, headline: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        println!("{headline}");
        println!("  ID: {}", task.id);
        println!("  Status: {}", task.status);
        if let Some(result) = &task.result {
            println!("  Result: {result}");
        }
    }
    Ok(())
}

fn print_task_details(task: &Task) {
    println!("Task Details:");
    println!("  ID: {}", task.id);
    println!("  Title: {}", task.title);
    println!("  Agent: {}", task.agent_id);
    println!("  Status: {}", task.status);
    println!("  Priority: {}", task.priority);
    println!("  Type: {}", task.task_type);
    if !task.description.is_empty() {
        println!("  Description: {}", task.description);
    }
    if let Some(source) = &task.source {
        println!("  Source: {source}");
    }
    if let Some(result) = &task.result {
        println!("  Result: {result}");
    }
    println!(
        "  Automation: auto_complete={}, auto_chain={}",
        task.auto_complete, task.auto_chain
    );
    println!(
        "  Created at: {}",
        task.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(started_at) = task.started_at {
        println!("  Started at: {}", started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(completed_at) = task.completed_at {
        println!(
            "  Completed at: {}",
            completed_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    if !task.metadata.is_empty() {
        println!("  Metadata:");
        for (key, value) in &task.metadata {
            println!("    {key}: {value}");
        }
    }
}

fn print_run_report(report: &RunReport) {
    for step in &report.steps {
        let short_id = &step.task_id.to_string()[..8];
        match &step.status {
            RunStatus::AwaitingCompletion { status } => println!(
                "{short_id} [{}] reported '{status}'; task left active for explicit complete/fail",
                step.agent_id
            ),
            RunStatus::ManualResolutionRequired => println!(
                "{short_id} [{}] produced no recognized status; task left active for manual resolution",
                step.agent_id
            ),
            RunStatus::Completed { status } => {
                println!("{short_id} [{}] completed with '{status}'", step.agent_id);
            }
            RunStatus::ChainHalted { status } => println!(
                "{short_id} [{}] completed with '{status}'; no transition, chain halted",
                step.agent_id
            ),
            RunStatus::WorkflowComplete => println!(
                "{short_id} [{}] completed; workflow finished",
                step.agent_id
            ),
            RunStatus::ChainedNotStarted { next_task } => println!(
                "{short_id} [{}] completed; successor {} created but not started",
                step.agent_id,
                &next_task.to_string()[..8]
            ),
        }
    }
}
