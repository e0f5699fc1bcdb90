//! Engine configuration model.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loaded by `ConfigLoader`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub workspace: WorkspaceConfig,
    pub invoker: InvokerConfig,
}

/// SQLite database settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: ".baton/baton.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
    /// json | pretty
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Filesystem layout for enhancement artifacts and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Root directory holding one subdirectory per enhancement.
    pub enhancements_dir: String,
    /// Agent contract registry file.
    pub agents_file: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            enhancements_dir: ".baton/enhancements".to_string(),
            agents_file: ".baton/agents.yaml".to_string(),
        }
    }
}

/// Agent subprocess invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokerConfig {
    /// Executable to run for agent invocations.
    pub command: String,
    /// Fixed arguments placed before the prompt.
    pub args: Vec<String>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec!["-p".to_string()],
        }
    }
}

impl Config {
    /// Database URL in the form sqlx expects.
    pub fn database_url(&self) -> String {
        format!("sqlite:{}", self.database.path)
    }
}
