//! Implementation of the `baton chain` command group.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::cli::context::AppContext;
use crate::services::ChainOutcome;

#[derive(Args, Debug)]
pub struct ChainArgs {
    #[command(subcommand)]
    pub command: ChainCommands,
}

#[derive(Subcommand, Debug)]
pub enum ChainCommands {
    /// Look up the successor agent a contract declares for a status
    NextAgent {
        /// Agent ID
        agent_id: String,

        /// Result status code
        status: String,
    },

    /// Derive and insert the successor of a completed task
    Run {
        /// Completed task ID
        task_id: Uuid,

        /// Result status the task completed with
        status: String,
    },
}

pub async fn execute(args: ChainArgs, json: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    match args.command {
        ChainCommands::NextAgent { agent_id, status } => {
            use crate::domain::ports::ContractRegistry;
            let contract = ctx
                .registry
                .get(&agent_id)
                .ok_or_else(|| anyhow!("Agent '{agent_id}' is not registered"))?;
            let next = contract.next_agent_for(&status);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "agent_id": agent_id,
                        "status": status,
                        "next_agent": next,
                    })
                );
            } else {
                match next {
                    Some(next) => println!("{next}"),
                    None => println!("No successor declared for '{status}'."),
                }
            }
            Ok(())
        }

        ChainCommands::Run { task_id, status } => {
            let outcome = ctx
                .chainer
                .auto_chain(task_id, &status)
                .await
                .context("Chaining failed")?;

            match &outcome {
                ChainOutcome::Halted { status } => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&outcome)?);
                    } else {
                        println!("No transition for '{status}'; chain halted.");
                    }
                }
                ChainOutcome::WorkflowComplete => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&outcome)?);
                    } else {
                        println!("Workflow complete.");
                    }
                }
                ChainOutcome::Chained { task, auto_start } => {
                    if !auto_start {
                        if json {
                            println!("{}", serde_json::to_string_pretty(&outcome)?);
                        } else {
                            println!(
                                "Successor {} created for '{}' (not auto-started).",
                                task.id, task.agent_id
                            );
                        }
                        return Ok(());
                    }
                    // transition asks for an immediate start, so drive the
                    // runner from the successor onwards
                    let report = ctx
                        .runner
                        .run(task.id)
                        .await
                        .context("Failed to run chained successor")?;
                    if json {
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&serde_json::json!({
                                "chained": task,
                                "run": report,
                            }))?
                        );
                    } else {
                        println!(
                            "Successor {} created for '{}' and started.",
                            task.id, task.agent_id
                        );
                        println!("{} run step(s) executed.", report.steps.len());
                    }
                }
            }
            Ok(())
        }
    }
}
