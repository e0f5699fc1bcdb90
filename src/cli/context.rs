//! Shared wiring for CLI commands: config, pool, services.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::invoker::ProcessInvoker;
use crate::adapters::registry::YamlContractRegistry;
use crate::adapters::sqlite::{
    all_embedded_migrations, create_pool, Migrator, SqliteTaskRepository, SqliteTemplateRepository,
};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{Chainer, OutputValidator, TaskRunner, TaskService, TemplateService};

type Tasks = TaskService<SqliteTaskRepository, YamlContractRegistry>;
type Templates = TemplateService<SqliteTemplateRepository, YamlContractRegistry>;
type Chain = Chainer<SqliteTaskRepository, SqliteTemplateRepository, YamlContractRegistry>;
type Runner = TaskRunner<
    SqliteTaskRepository,
    SqliteTemplateRepository,
    YamlContractRegistry,
    ProcessInvoker,
>;

/// Everything a command handler needs, built once per invocation.
pub struct AppContext {
    pub registry: Arc<YamlContractRegistry>,
    pub tasks: Arc<Tasks>,
    pub templates: Templates,
    pub chainer: Arc<Chain>,
    pub runner: Runner,
    pub validator: OutputValidator<YamlContractRegistry>,
}

impl AppContext {
    /// Load configuration, open the database, run pending migrations and
    /// wire the service graph.
    pub async fn load() -> Result<Self> {
        let config = ConfigLoader::load().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    pub async fn with_config(config: Config) -> Result<Self> {
        let pool = create_pool(&config.database_url(), None)
            .await
            .context("Failed to open database")?;
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .context("Failed to run database migrations")?;

        let registry = Arc::new(
            YamlContractRegistry::load(&config.workspace.agents_file)
                .context("Failed to load agent contracts")?,
        );
        let task_repo = Arc::new(SqliteTaskRepository::new(pool.clone()));
        let template_repo = Arc::new(SqliteTemplateRepository::new(pool));

        let tasks = Arc::new(TaskService::new(task_repo, Arc::clone(&registry)));
        let templates = TemplateService::new(Arc::clone(&template_repo), Arc::clone(&registry));
        let chainer = Arc::new(Chainer::new(
            Arc::clone(&tasks),
            template_repo,
            Arc::clone(&registry),
            config.workspace.enhancements_dir.clone(),
        ));
        let invoker = Arc::new(ProcessInvoker::new(config.invoker.clone()));
        let runner = TaskRunner::new(Arc::clone(&tasks), Arc::clone(&chainer), invoker);
        let validator = OutputValidator::new(Arc::clone(&registry));

        Ok(Self {
            registry,
            tasks,
            templates,
            chainer,
            runner,
            validator,
        })
    }
}
