//! Contract-driven output validation.
//!
//! Checks an agent's declared artifacts under an enhancement directory:
//! the root document, any additional required files, and the metadata
//! header inside the root document. Validation never mutates anything;
//! callers decide what a failed report means for the task.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::errors::{EngineError, EngineResult};
use crate::domain::models::REQUIRED_METADATA_KEYS;
use crate::domain::ports::ContractRegistry;

/// Outcome of validating one agent's outputs for one enhancement.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub agent_id: String,
    pub enhancement_dir: PathBuf,
    /// Human-readable descriptions of everything absent or malformed.
    /// Empty means the outputs satisfy the contract.
    pub missing: Vec<String>,
}

impl ValidationReport {
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

pub struct OutputValidator<R> {
    registry: Arc<R>,
}

impl<R: ContractRegistry> OutputValidator<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self { registry }
    }

    /// Validate `agent_id`'s outputs under `enhancement_dir` against its
    /// contract. All problems are collected into one report; the first
    /// failure never masks the rest.
    pub fn validate(&self, agent_id: &str, enhancement_dir: &Path) -> EngineResult<ValidationReport> {
        let contract = self
            .registry
            .get(agent_id)
            .ok_or_else(|| EngineError::AgentNotFound(agent_id.to_string()))?;

        let output_dir = enhancement_dir.join(&contract.output_dir);
        let root = output_dir.join(&contract.root_document);
        let mut missing = Vec::new();

        if root.is_file() {
            if contract.metadata_required {
                let content = fs::read_to_string(&root)?;
                for key in missing_metadata_keys(&content) {
                    missing.push(format!(
                        "{}: metadata field '{}'",
                        contract.root_document_path(),
                        key
                    ));
                }
            }
        } else {
            missing.push(contract.root_document_path());
        }

        for file in &contract.additional_required {
            if !output_dir.join(file).is_file() {
                missing.push(format!("{}/{}", contract.output_dir, file));
            }
        }

        debug!(agent = agent_id, missing = missing.len(), "validated outputs");
        Ok(ValidationReport {
            agent_id: agent_id.to_string(),
            enhancement_dir: enhancement_dir.to_path_buf(),
            missing,
        })
    }
}

/// Required header keys absent from a document's metadata header.
///
/// The header is the block of lines before the first line equal to `---`.
/// A leading `---` opener (after blank lines) is skipped. A document with
/// no terminating delimiter has no header at all.
fn missing_metadata_keys(content: &str) -> Vec<&'static str> {
    let Some(header) = header_lines(content) else {
        return REQUIRED_METADATA_KEYS.to_vec();
    };
    REQUIRED_METADATA_KEYS
        .iter()
        .copied()
        .filter(|key| {
            let prefix = format!("{key}:");
            !header
                .iter()
                .any(|line| line.trim_start().starts_with(&prefix))
        })
        .collect()
}

fn header_lines(content: &str) -> Option<Vec<&str>> {
    let mut collected = Vec::new();
    let mut seen_content = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == "---" {
            if !seen_content && collected.is_empty() {
                // opener of a fenced header block
                seen_content = true;
                continue;
            }
            return Some(collected);
        }
        if trimmed.is_empty() && !seen_content {
            continue;
        }
        seen_content = true;
        collected.push(line);
    }
    None
}
