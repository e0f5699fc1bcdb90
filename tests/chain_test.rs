mod common;

use std::sync::Arc;

use baton::adapters::invoker::{MockInvoker, MockResponse};
use baton::domain::models::{Task, TaskStatus};
use baton::domain::ports::TaskFilter;
use baton::services::{ChainOutcome, OutputValidator, TaskRunner};
use baton::EngineError;

use common::{builtin_registry, chainer, setup_pool, task_service, write_root_document};

// Scenario: a completed analysis task with valid outputs chains into an
// architect task inheriting the automation flags, and the runner starts it.
#[tokio::test]
async fn test_valid_completion_chains_and_auto_starts_successor() {
    let tmp = tempfile::tempdir().unwrap();
    let pool = setup_pool().await;
    let registry = builtin_registry();
    let tasks = task_service(&pool, &registry);
    let chain = Arc::new(chainer(&pool, &registry, &tasks, tmp.path()));

    write_root_document(
        tmp.path(),
        "login-rework",
        "analysis",
        "analysis_summary.md",
        "requirements-analyst",
        "READY_FOR_DEVELOPMENT",
    );

    let task = tasks
        .add(
            Task::new("Analyse login rework", "requirements-analyst")
                .with_automation(true, true)
                .with_enhancement("login-rework"),
        )
        .await
        .unwrap();
    tasks.start(task.id).await.unwrap();
    tasks
        .complete(task.id, "READY_FOR_DEVELOPMENT")
        .await
        .unwrap();

    let outcome = chain
        .auto_chain(task.id, "READY_FOR_DEVELOPMENT")
        .await
        .unwrap();
    let ChainOutcome::Chained { task: successor, auto_start } = outcome else {
        panic!("expected a chained successor");
    };
    assert!(auto_start);
    assert_eq!(successor.agent_id, "architect");
    assert!(successor.auto_complete);
    assert!(successor.auto_chain);
    assert_eq!(successor.status, TaskStatus::Pending);

    // the runner picks the successor up; the mock architect produces no
    // recognized status, so it stays active awaiting manual resolution
    let invoker = Arc::new(MockInvoker::with_default_response(MockResponse::transcript(
        "working notes, nothing conclusive",
    )));
    let runner = TaskRunner::new(Arc::clone(&tasks), Arc::clone(&chain), invoker);
    runner.run(successor.id).await.unwrap();
    assert_eq!(
        tasks.get(successor.id).await.unwrap().status,
        TaskStatus::Active
    );
}

// Scenario: a BLOCKED completion never chains; the stored result keeps the
// reason verbatim.
#[tokio::test]
async fn test_blocked_completion_creates_no_successor() {
    let tmp = tempfile::tempdir().unwrap();
    let pool = setup_pool().await;
    let registry = builtin_registry();
    let tasks = task_service(&pool, &registry);
    let chain = chainer(&pool, &registry, &tasks, tmp.path());

    write_root_document(
        tmp.path(),
        "login-rework",
        "analysis",
        "analysis_summary.md",
        "requirements-analyst",
        "BLOCKED: missing API keys",
    );

    let task = tasks
        .add(
            Task::new("Analyse login rework", "requirements-analyst")
                .with_automation(true, true)
                .with_enhancement("login-rework"),
        )
        .await
        .unwrap();
    tasks.start(task.id).await.unwrap();
    tasks
        .complete(task.id, "BLOCKED: missing API keys")
        .await
        .unwrap();

    let outcome = chain
        .auto_chain(task.id, "BLOCKED: missing API keys")
        .await
        .unwrap();
    assert!(matches!(outcome, ChainOutcome::Halted { .. }));

    let all = tasks.list(TaskFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(
        all[0].result.as_deref(),
        Some("BLOCKED: missing API keys")
    );
}

// Scenario: missing root document fails validation; no successor, and the
// completed parent is untouched.
#[tokio::test]
async fn test_missing_outputs_block_chain_without_mutating_parent() {
    let tmp = tempfile::tempdir().unwrap();
    let pool = setup_pool().await;
    let registry = builtin_registry();
    let tasks = task_service(&pool, &registry);
    let chain = chainer(&pool, &registry, &tasks, tmp.path());

    let task = tasks
        .add(
            Task::new("Analyse login rework", "requirements-analyst")
                .with_automation(true, true)
                .with_enhancement("login-rework"),
        )
        .await
        .unwrap();
    tasks.start(task.id).await.unwrap();
    let completed = tasks
        .complete(task.id, "READY_FOR_DEVELOPMENT")
        .await
        .unwrap();

    let err = chain
        .auto_chain(task.id, "READY_FOR_DEVELOPMENT")
        .await
        .unwrap_err();
    let EngineError::ValidationFailed { agent, missing } = err else {
        panic!("expected ValidationFailed");
    };
    assert_eq!(agent, "requirements-analyst");
    assert_eq!(missing, vec!["analysis/analysis_summary.md"]);

    let all = tasks.list(TaskFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(tasks.get(task.id).await.unwrap(), completed);
}

// Validation is purely structural: two runs against an unchanged filesystem
// agree exactly.
#[tokio::test]
async fn test_validation_idempotent_on_unchanged_filesystem() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = builtin_registry();
    let validator = OutputValidator::new(Arc::clone(&registry));

    let dir = tmp.path().join("login-rework");
    std::fs::create_dir_all(&dir).unwrap();

    let first = validator.validate("architect", &dir).unwrap();
    let second = validator.validate("architect", &dir).unwrap();
    assert_eq!(first.missing, second.missing);
    assert!(!first.is_satisfied());
}
