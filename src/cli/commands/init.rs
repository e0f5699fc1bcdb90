//! Implementation of the `baton init` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tokio::fs;

use crate::adapters::sqlite::{all_embedded_migrations, create_pool, verify_connection, Migrator};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub database_initialized: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.database_initialized {
            lines.push("\nDatabase initialized at .baton/baton.db".to_string());
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let baton_dir = target_path.join(".baton");
    if baton_dir.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            initialized_path: target_path,
            directories_created: vec![],
            database_initialized: false,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    if args.force && baton_dir.exists() {
        fs::remove_dir_all(&baton_dir)
            .await
            .context("Failed to remove existing .baton directory")?;
    }

    let config = Config::default();
    let mut directories_created = Vec::new();
    for dir in [
        baton_dir.clone(),
        target_path.join(&config.workspace.enhancements_dir),
    ] {
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        directories_created.push(
            dir.strip_prefix(&target_path)
                .unwrap_or(&dir)
                .display()
                .to_string(),
        );
    }

    let config_path = baton_dir.join("config.yaml");
    let config_text =
        serde_yaml::to_string(&config).context("Failed to serialize default configuration")?;
    fs::write(&config_path, config_text)
        .await
        .context("Failed to write config.yaml")?;

    let database_path = target_path.join(&config.database.path);
    let pool = create_pool(&format!("sqlite:{}", database_path.display()), None)
        .await
        .context("Failed to create database")?;
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .context("Failed to run migrations")?;
    verify_connection(&pool)
        .await
        .context("Database connectivity check failed")?;
    pool.close().await;

    let output_data = InitOutput {
        success: true,
        message: format!("Initialized baton project at {}", target_path.display()),
        initialized_path: target_path,
        directories_created,
        database_initialized: true,
    };
    output(&output_data, json_mode);
    Ok(())
}
