use clap::Parser;
use uuid::Uuid;

use baton::cli::commands::task::TaskCommands;
use baton::cli::commands::template::TemplateCommands;
use baton::cli::{Cli, Commands};

#[test]
fn test_parse_task_add() {
    let cli = Cli::try_parse_from([
        "baton",
        "task",
        "add",
        "Analyse the login feature",
        "--agent",
        "requirements-analyst",
        "--priority",
        "high",
        "--task-type",
        "analysis",
        "--source",
        "docs/spec.md",
        "--auto-complete",
        "--auto-chain",
    ])
    .unwrap();

    let Commands::Task(args) = cli.command else {
        panic!("wrong top-level command");
    };
    let TaskCommands::Add {
        title,
        agent,
        priority,
        task_type,
        source,
        auto_complete,
        auto_chain,
        ..
    } = args.command
    else {
        panic!("wrong task command");
    };
    assert_eq!(title, "Analyse the login feature");
    assert_eq!(agent, "requirements-analyst");
    assert_eq!(priority, "high");
    assert_eq!(task_type, "analysis");
    assert_eq!(source.as_deref(), Some("docs/spec.md"));
    assert!(auto_complete);
    assert!(auto_chain);
}

#[test]
fn test_parse_task_add_defaults() {
    let cli = Cli::try_parse_from(["baton", "task", "add", "Quick job", "--agent", "reviewer"])
        .unwrap();
    let Commands::Task(args) = cli.command else {
        panic!("wrong top-level command");
    };
    let TaskCommands::Add {
        priority,
        task_type,
        auto_complete,
        auto_chain,
        ..
    } = args.command
    else {
        panic!("wrong task command");
    };
    assert_eq!(priority, "normal");
    assert_eq!(task_type, "general");
    assert!(!auto_complete);
    assert!(!auto_chain);
}

#[test]
fn test_parse_task_add_requires_agent() {
    assert!(Cli::try_parse_from(["baton", "task", "add", "No agent"]).is_err());
}

#[test]
fn test_parse_task_complete_with_status() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from([
        "baton",
        "task",
        "complete",
        &id.to_string(),
        "READY_FOR_DEVELOPMENT",
    ])
    .unwrap();
    let Commands::Task(args) = cli.command else {
        panic!("wrong top-level command");
    };
    let TaskCommands::Complete { task_id, result } = args.command else {
        panic!("wrong task command");
    };
    assert_eq!(task_id, id);
    assert_eq!(result, "READY_FOR_DEVELOPMENT");
}

#[test]
fn test_parse_global_json_flag_after_subcommand() {
    let cli = Cli::try_parse_from(["baton", "task", "status", "--json"]).unwrap();
    assert!(cli.json);
}

#[test]
fn test_parse_template_add_transition() {
    let cli = Cli::try_parse_from([
        "baton",
        "template",
        "add-transition",
        "pipeline",
        "0",
        "READY_FOR_DEVELOPMENT",
        "--next-step",
        "architect",
        "--auto-chain",
    ])
    .unwrap();
    let Commands::Template(args) = cli.command else {
        panic!("wrong top-level command");
    };
    let TemplateCommands::AddTransition {
        name,
        index,
        status,
        next_step,
        auto_chain,
        no_auto_start,
        ..
    } = args.command
    else {
        panic!("wrong template command");
    };
    assert_eq!(name, "pipeline");
    assert_eq!(index, 0);
    assert_eq!(status, "READY_FOR_DEVELOPMENT");
    assert_eq!(next_step.as_deref(), Some("architect"));
    assert!(auto_chain);
    assert!(!no_auto_start);
}

#[test]
fn test_parse_rejects_unknown_command() {
    assert!(Cli::try_parse_from(["baton", "frobnicate"]).is_err());
}
