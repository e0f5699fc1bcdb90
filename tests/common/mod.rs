#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;

use baton::adapters::registry::YamlContractRegistry;
use baton::adapters::sqlite::{
    all_embedded_migrations, create_test_pool, Migrator, SqliteTaskRepository,
    SqliteTemplateRepository,
};
use baton::services::{Chainer, TaskService, TemplateService};

pub type Tasks = TaskService<SqliteTaskRepository, YamlContractRegistry>;
pub type Templates = TemplateService<SqliteTemplateRepository, YamlContractRegistry>;
pub type Chain = Chainer<SqliteTaskRepository, SqliteTemplateRepository, YamlContractRegistry>;

/// In-memory database with the full schema applied.
pub async fn setup_pool() -> SqlitePool {
    let pool = create_test_pool().await.expect("test pool");
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await
        .expect("migrations");
    pool
}

pub fn builtin_registry() -> Arc<YamlContractRegistry> {
    Arc::new(YamlContractRegistry::builtin())
}

pub fn task_service(pool: &SqlitePool, registry: &Arc<YamlContractRegistry>) -> Arc<Tasks> {
    Arc::new(TaskService::new(
        Arc::new(SqliteTaskRepository::new(pool.clone())),
        Arc::clone(registry),
    ))
}

pub fn template_service(pool: &SqlitePool, registry: &Arc<YamlContractRegistry>) -> Templates {
    TemplateService::new(
        Arc::new(SqliteTemplateRepository::new(pool.clone())),
        Arc::clone(registry),
    )
}

pub fn chainer(
    pool: &SqlitePool,
    registry: &Arc<YamlContractRegistry>,
    tasks: &Arc<Tasks>,
    enhancements_root: &Path,
) -> Chain {
    Chainer::new(
        Arc::clone(tasks),
        Arc::new(SqliteTemplateRepository::new(pool.clone())),
        Arc::clone(registry),
        enhancements_root.to_path_buf(),
    )
}

/// Write a contract-satisfying root document for one agent under an
/// enhancement directory.
pub fn write_root_document(
    enhancements_root: &Path,
    enhancement: &str,
    output_dir: &str,
    document: &str,
    agent: &str,
    status: &str,
) {
    let dir = enhancements_root.join(enhancement).join(output_dir);
    std::fs::create_dir_all(&dir).expect("output dir");
    let content = format!(
        "enhancement: {enhancement}\nagent: {agent}\ntask_id: 00000000\ntimestamp: 2026-08-01T10:00:00Z\nstatus: {status}\n---\n\n# Summary\n"
    );
    std::fs::write(dir.join(document), content).expect("root document");
}
