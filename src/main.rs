//! Baton CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use baton::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => baton::cli::commands::init::execute(args, cli.json).await,
        Commands::Task(args) => baton::cli::commands::task::execute(args, cli.json).await,
        Commands::Agent(args) => baton::cli::commands::agent::execute(args, cli.json).await,
        Commands::Outputs(args) => baton::cli::commands::outputs::execute(args, cli.json).await,
        Commands::Chain(args) => baton::cli::commands::chain::execute(args, cli.json).await,
        Commands::Template(args) => baton::cli::commands::template::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        baton::cli::handle_error(err, cli.json);
    }
}
