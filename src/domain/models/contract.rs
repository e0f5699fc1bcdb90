//! Agent contract model.
//!
//! A contract declares what an agent consumes, what it must deliver, and
//! the terminal status vocabulary it may report. Contracts are read-only
//! configuration, edited out-of-band and loaded by the registry adapter.

use serde::{Deserialize, Serialize};

/// The five keys every metadata header must carry when a contract sets
/// `metadata_required`.
pub const REQUIRED_METADATA_KEYS: [&str; 5] =
    ["enhancement", "agent", "task_id", "timestamp", "status"];

/// Whether a declared status represents success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    #[default]
    Success,
    Failure,
}

/// One entry of an agent's declared status vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSpec {
    /// Status code as reported by the agent (e.g. `READY_FOR_DEVELOPMENT`)
    pub code: String,
    #[serde(default)]
    pub kind: StatusKind,
    /// Candidate successor agents for this status, in preference order
    #[serde(default)]
    pub next_agents: Vec<String>,
    /// Whether this status class needs external issue-tracker sync.
    /// The connector itself lives outside the engine.
    #[serde(default)]
    pub external_sync: bool,
}

/// Declared expectations an agent must satisfy for its output to count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentContract {
    /// Agent identifier (e.g. `requirements-analyst`)
    pub id: String,
    /// Role, mapped to successor task types
    pub role: String,
    #[serde(default)]
    pub description: String,
    /// Required input patterns
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Directory under the enhancement dir where output lands
    pub output_dir: String,
    /// Root output document name
    pub root_document: String,
    /// Further files that must exist alongside the root document
    #[serde(default)]
    pub additional_required: Vec<String>,
    /// Declared status vocabulary
    #[serde(default)]
    pub statuses: Vec<StatusSpec>,
    /// Whether the root document must carry a metadata header
    #[serde(default)]
    pub metadata_required: bool,
}

impl AgentContract {
    /// Look up the declared spec for a status code.
    pub fn status_spec(&self, code: &str) -> Option<&StatusSpec> {
        self.statuses.iter().find(|s| s.code == code)
    }

    /// First candidate successor agent for a status code, if declared.
    pub fn next_agent_for(&self, code: &str) -> Option<&str> {
        self.status_spec(code)?
            .next_agents
            .first()
            .map(String::as_str)
    }

    /// Relative path of the root document under an enhancement directory.
    pub fn root_document_path(&self) -> String {
        format!("{}/{}", self.output_dir, self.root_document)
    }
}

/// Fixed role→task_type table used when constructing successor tasks.
pub fn role_to_task_type(role: &str) -> &'static str {
    match role {
        "analysis" => "analysis",
        "architecture" => "design",
        "development" => "development",
        "testing" => "testing",
        "review" => "review",
        _ => "general",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> AgentContract {
        AgentContract {
            id: "requirements-analyst".to_string(),
            role: "analysis".to_string(),
            description: String::new(),
            inputs: vec!["*.md".to_string()],
            output_dir: "analysis".to_string(),
            root_document: "analysis_summary.md".to_string(),
            additional_required: vec![],
            statuses: vec![StatusSpec {
                code: "READY_FOR_DEVELOPMENT".to_string(),
                kind: StatusKind::Success,
                next_agents: vec!["architect".to_string()],
                external_sync: false,
            }],
            metadata_required: true,
        }
    }

    #[test]
    fn test_next_agent_lookup() {
        let c = contract();
        assert_eq!(c.next_agent_for("READY_FOR_DEVELOPMENT"), Some("architect"));
        assert_eq!(c.next_agent_for("READY_FOR_NOTHING"), None);
    }

    #[test]
    fn test_root_document_path() {
        assert_eq!(contract().root_document_path(), "analysis/analysis_summary.md");
    }

    #[test]
    fn test_role_table() {
        assert_eq!(role_to_task_type("analysis"), "analysis");
        assert_eq!(role_to_task_type("architecture"), "design");
        assert_eq!(role_to_task_type("testing"), "testing");
        assert_eq!(role_to_task_type("janitor"), "general");
    }
}
