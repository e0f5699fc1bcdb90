//! Implementation of the `baton agent` command group.

use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;
use crate::cli::output::format_contract_table;
use crate::domain::ports::ContractRegistry;

#[derive(Args, Debug)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommands,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// List registered agent contracts
    List,

    /// Show one agent's contract in full
    Show {
        /// Agent ID
        agent_id: String,
    },
}

pub async fn execute(args: AgentArgs, json: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    match args.command {
        AgentCommands::List => {
            let contracts = ctx.registry.all();
            if json {
                println!("{}", serde_json::to_string_pretty(&contracts)?);
            } else if contracts.is_empty() {
                println!("No agents registered.");
            } else {
                println!("{}", format_contract_table(&contracts));
            }
            Ok(())
        }

        AgentCommands::Show { agent_id } => {
            let contract = ctx
                .registry
                .get(&agent_id)
                .ok_or_else(|| anyhow!("Agent '{agent_id}' is not registered"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contract)?);
            } else {
                println!("Agent: {}", contract.id);
                println!("  Role: {}", contract.role);
                if !contract.description.is_empty() {
                    println!("  Description: {}", contract.description);
                }
                println!("  Inputs: {}", contract.inputs.join(", "));
                println!("  Root document: {}", contract.root_document_path());
                if !contract.additional_required.is_empty() {
                    println!(
                        "  Additional required: {}",
                        contract.additional_required.join(", ")
                    );
                }
                println!("  Metadata required: {}", contract.metadata_required);
                println!("  Statuses:");
                for status in &contract.statuses {
                    let next = if status.next_agents.is_empty() {
                        "(terminal)".to_string()
                    } else {
                        format!("→ {}", status.next_agents.join(", "))
                    };
                    let sync = if status.external_sync {
                        " [external sync]"
                    } else {
                        ""
                    };
                    println!("    {} {next}{sync}", status.code);
                }

                let state = ctx
                    .tasks
                    .agent_state(&agent_id)
                    .await
                    .context("Failed to query agent state")?;
                if let Some(state) = state {
                    println!("  Activity: {}", state.activity.as_str());
                    if let Some(task) = state.current_task {
                        println!("  Current task: {task}");
                    }
                }
            }
            Ok(())
        }
    }
}
