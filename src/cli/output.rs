//! Output formatting utilities for the CLI.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use serde::Serialize;

use crate::domain::models::{AgentContract, AgentState, Task, WorkflowStep, WorkflowTemplate};

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
        );
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..."
/// if truncated. Counts chars, not bytes, so multibyte titles are safe.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(cells: &[&str]) -> Vec<Cell> {
    cells
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

pub fn format_task_table(tasks: &[Task]) -> String {
    let mut table = base_table();
    table.set_header(header(&["ID", "Title", "Agent", "Status", "Priority", "Type"]));
    for task in tasks {
        table.add_row(vec![
            Cell::new(&task.id.to_string()[..8]),
            Cell::new(truncate(&task.title, 40)),
            Cell::new(&task.agent_id),
            Cell::new(task.status.to_string()),
            Cell::new(task.priority.to_string()),
            Cell::new(&task.task_type),
        ]);
    }
    table.to_string()
}

pub fn format_agent_state_table(agents: &[AgentState]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Agent", "Activity", "Current Task", "Updated"]));
    for agent in agents {
        table.add_row(vec![
            Cell::new(&agent.agent_id),
            Cell::new(agent.activity.as_str()),
            Cell::new(
                agent
                    .current_task
                    .map(|id| id.to_string()[..8].to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(agent.updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]);
    }
    table.to_string()
}

pub fn format_contract_table(contracts: &[AgentContract]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Agent", "Role", "Output", "Statuses"]));
    for contract in contracts {
        let statuses: Vec<&str> = contract.statuses.iter().map(|s| s.code.as_str()).collect();
        table.add_row(vec![
            Cell::new(&contract.id),
            Cell::new(&contract.role),
            Cell::new(contract.root_document_path()),
            Cell::new(statuses.join(", ")),
        ]);
    }
    table.to_string()
}

pub fn format_template_table(templates: &[WorkflowTemplate]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Name", "Steps", "Description"]));
    for template in templates {
        table.add_row(vec![
            Cell::new(&template.name),
            Cell::new(template.steps.len().to_string()),
            Cell::new(truncate(&template.description, 50)),
        ]);
    }
    table.to_string()
}

pub fn format_step_table(steps: &[WorkflowStep]) -> String {
    let mut table = base_table();
    table.set_header(header(&["#", "Agent", "Input", "Required Output", "Transitions"]));
    for (i, step) in steps.iter().enumerate() {
        let transitions: Vec<String> = step
            .on_status
            .iter()
            .map(|(status, t)| match &t.next_step {
                Some(next) => format!("{status} → {next}"),
                None => format!("{status} → (end)"),
            })
            .collect();
        table.add_row(vec![
            Cell::new(i.to_string()),
            Cell::new(&step.agent_id),
            Cell::new(truncate(&step.input, 35)),
            Cell::new(&step.required_output),
            Cell::new(transitions.join("\n")),
        ]);
    }
    table.to_string()
}
