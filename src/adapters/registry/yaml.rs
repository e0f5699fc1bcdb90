//! YAML-backed agent contract registry.
//!
//! Contracts are configuration: they live in `.baton/agents.yaml` and are
//! loaded once. When the file is absent the built-in pipeline applies, so
//! a fresh checkout works without any setup.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::{AgentContract, StatusKind, StatusSpec};
use crate::domain::ports::ContractRegistry;

/// Shape of the agents.yaml document.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    agents: Vec<AgentContract>,
}

/// In-memory registry keyed by agent id.
#[derive(Debug)]
pub struct YamlContractRegistry {
    contracts: BTreeMap<String, AgentContract>,
}

impl YamlContractRegistry {
    /// Load from a YAML file, or fall back to the built-in pipeline when
    /// the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "agents file absent, using built-in contracts");
            return Ok(Self::builtin());
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("Cannot read {}: {e}", path.display()))
        })?;
        let file: RegistryFile = serde_yaml::from_str(&text).map_err(|e| {
            EngineError::Configuration(format!("Malformed {}: {e}", path.display()))
        })?;

        let mut contracts = BTreeMap::new();
        for contract in file.agents {
            if contract.id.trim().is_empty() {
                return Err(EngineError::Configuration(
                    "Agent contract with empty id".to_string(),
                ));
            }
            if contracts.insert(contract.id.clone(), contract).is_some() {
                return Err(EngineError::Configuration(
                    "Duplicate agent id in agents file".to_string(),
                ));
            }
        }
        Ok(Self { contracts })
    }

    /// The built-in analysis → design → development → testing pipeline.
    pub fn builtin() -> Self {
        let contracts = builtin_contracts()
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        Self { contracts }
    }

    /// Build a registry from explicit contracts (tests).
    pub fn from_contracts(contracts: Vec<AgentContract>) -> Self {
        Self {
            contracts: contracts.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }
}

impl ContractRegistry for YamlContractRegistry {
    fn get(&self, agent_id: &str) -> Option<AgentContract> {
        self.contracts.get(agent_id).cloned()
    }

    fn all(&self) -> Vec<AgentContract> {
        self.contracts.values().cloned().collect()
    }
}

fn status(code: &str, next: &[&str]) -> StatusSpec {
    StatusSpec {
        code: code.to_string(),
        kind: StatusKind::Success,
        next_agents: next.iter().map(ToString::to_string).collect(),
        external_sync: false,
    }
}

/// Default contract set shipped with the engine.
pub fn builtin_contracts() -> Vec<AgentContract> {
    vec![
        AgentContract {
            id: "requirements-analyst".to_string(),
            role: "analysis".to_string(),
            description: "Analyzes an enhancement spec and produces requirements".to_string(),
            inputs: vec!["*.md".to_string()],
            output_dir: "analysis".to_string(),
            root_document: "analysis_summary.md".to_string(),
            additional_required: vec![],
            statuses: vec![status("READY_FOR_DEVELOPMENT", &["architect"])],
            metadata_required: true,
        },
        AgentContract {
            id: "architect".to_string(),
            role: "architecture".to_string(),
            description: "Designs the implementation approach".to_string(),
            inputs: vec!["analysis/*.md".to_string()],
            output_dir: "design".to_string(),
            root_document: "design_summary.md".to_string(),
            additional_required: vec![],
            statuses: vec![status("READY_FOR_IMPLEMENTATION", &["developer"])],
            metadata_required: true,
        },
        AgentContract {
            id: "developer".to_string(),
            role: "development".to_string(),
            description: "Implements the designed changes".to_string(),
            inputs: vec!["design/*.md".to_string()],
            output_dir: "implementation".to_string(),
            root_document: "implementation_summary.md".to_string(),
            additional_required: vec![],
            statuses: vec![status("READY_FOR_TESTING", &["tester"])],
            metadata_required: true,
        },
        AgentContract {
            id: "tester".to_string(),
            role: "testing".to_string(),
            description: "Verifies the implementation against requirements".to_string(),
            inputs: vec!["implementation/*.md".to_string()],
            output_dir: "testing".to_string(),
            root_document: "test_report.md".to_string(),
            additional_required: vec![],
            statuses: vec![
                status("TESTING_COMPLETE", &[]),
                StatusSpec {
                    code: "TESTS_FAILED".to_string(),
                    kind: StatusKind::Failure,
                    next_agents: vec!["developer".to_string()],
                    external_sync: true,
                },
            ],
            metadata_required: true,
        },
        AgentContract {
            id: "reviewer".to_string(),
            role: "review".to_string(),
            description: "Reviews delivered work for quality".to_string(),
            inputs: vec!["**/*.md".to_string()],
            output_dir: "review".to_string(),
            root_document: "review_summary.md".to_string(),
            additional_required: vec![],
            statuses: vec![status("REVIEW_COMPLETE", &[])],
            metadata_required: false,
        },
    ]
}
