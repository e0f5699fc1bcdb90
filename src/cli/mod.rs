//! CLI surface: clap command tree, output rendering, shared wiring.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};

pub use context::AppContext;
pub use output::{output, CommandOutput};

#[derive(Parser)]
#[command(name = "baton")]
#[command(about = "Baton - Agent task queue and workflow chaining engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize baton configuration and database
    Init(commands::init::InitArgs),

    /// Task queue commands
    Task(commands::task::TaskArgs),

    /// Agent contract commands
    Agent(commands::agent::AgentArgs),

    /// Output validation commands
    Outputs(commands::outputs::OutputsArgs),

    /// Successor resolution and auto-chaining
    Chain(commands::chain::ChainArgs),

    /// Workflow template commands
    Template(commands::template::TemplateArgs),
}

/// Print an error in the requested format and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        eprintln!(
            "{}",
            serde_json::json!({ "error": format!("{err:#}") })
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
