//! Terminal agent outcome, parsed once at the invocation boundary.
//!
//! Agents report completion by emitting a status token near the end of
//! their transcript. The raw token is stored verbatim on the task record;
//! this tagged union is what the chaining logic branches on, so prefix
//! matching never leaks into call sites.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static READY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"READY_FOR_[A-Z_]+").expect("valid pattern"));
static COMPLETE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][A-Z_]*_COMPLETE").expect("valid pattern"));

/// Prefix marking a deliberate workflow halt. Blocked statuses never have
/// a registered transition.
pub const BLOCKED_PREFIX: &str = "BLOCKED:";

/// Classified terminal status of an agent invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// A `READY_FOR_*` token: the agent's deliverable is ready for the
    /// next stage.
    Ready { token: String },
    /// A `*_COMPLETE` token: a stage finished in place.
    Complete { token: String },
    /// A `BLOCKED:` status; the reason follows the prefix.
    Blocked { reason: String },
    /// No recognizable status token. Valid and non-fatal; the task stays
    /// active until an operator completes or fails it.
    Unknown,
}

impl TaskOutcome {
    /// Classify a raw status string, e.g. one supplied to `complete`.
    pub fn from_status(status: &str) -> Self {
        let trimmed = status.trim();
        if let Some(reason) = trimmed.strip_prefix(BLOCKED_PREFIX) {
            return Self::Blocked {
                reason: reason.trim().to_string(),
            };
        }
        if let Some(m) = READY_RE.find(trimmed) {
            return Self::Ready {
                token: m.as_str().to_string(),
            };
        }
        if let Some(m) = COMPLETE_RE.find(trimmed) {
            return Self::Complete {
                token: m.as_str().to_string(),
            };
        }
        Self::Unknown
    }

    /// Scan a transcript from the end for the first status token.
    ///
    /// Later lines win: agents often echo candidate statuses while working
    /// and only the final report is authoritative.
    pub fn scan_transcript(transcript: &str) -> Self {
        for line in transcript.lines().rev() {
            let outcome = Self::from_status(line);
            if outcome != Self::Unknown {
                return outcome;
            }
        }
        Self::Unknown
    }

    /// The status string to record on the task, when one exists.
    pub fn status_string(&self) -> Option<String> {
        match self {
            Self::Ready { token } | Self::Complete { token } => Some(token.clone()),
            Self::Blocked { reason } => Some(format!("{BLOCKED_PREFIX} {reason}")),
            Self::Unknown => None,
        }
    }

    /// Whether this outcome can ever match a registered transition.
    pub fn is_chainable(&self) -> bool {
        matches!(self, Self::Ready { .. } | Self::Complete { .. })
    }

    /// The bare token used for transition lookup.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Ready { token } | Self::Complete { token } => Some(token),
            _ => None,
        }
    }
}
