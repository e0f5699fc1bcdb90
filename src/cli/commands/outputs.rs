//! Implementation of the `baton outputs` command group.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use crate::cli::context::AppContext;

#[derive(Args, Debug)]
pub struct OutputsArgs {
    #[command(subcommand)]
    pub command: OutputsCommands,
}

#[derive(Subcommand, Debug)]
pub enum OutputsCommands {
    /// Validate an agent's outputs against its contract
    Validate {
        /// Agent ID
        agent_id: String,

        /// Enhancement directory holding the agent's outputs
        enhancement_dir: PathBuf,
    },
}

pub async fn execute(args: OutputsArgs, json: bool) -> Result<()> {
    let ctx = AppContext::load().await?;
    match args.command {
        OutputsCommands::Validate {
            agent_id,
            enhancement_dir,
        } => {
            let report = ctx
                .validator
                .validate(&agent_id, &enhancement_dir)
                .context("Validation could not run")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.is_satisfied() {
                println!(
                    "Outputs for '{}' under {} satisfy the contract.",
                    agent_id,
                    enhancement_dir.display()
                );
            } else {
                println!(
                    "Outputs for '{}' under {} are incomplete:",
                    agent_id,
                    enhancement_dir.display()
                );
                for item in &report.missing {
                    println!("  - {item}");
                }
            }

            if !report.is_satisfied() {
                bail!("{} required item(s) missing", report.missing.len());
            }
            Ok(())
        }
    }
}
