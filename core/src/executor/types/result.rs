use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::task::TargetId;

/// A named value produced by a successful target, readable by its dependents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub key: String,
    pub value: String,
}

impl Artifact {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Outcome of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildResult {
    Success { artifacts: Vec<Artifact> },
    Failed { message: String },
    DependencyFailed { dependency: TargetId },
}

impl BuildResult {
    pub fn ok(artifacts: Vec<Artifact>) -> Self {
        Self::Success { artifacts }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn dependency_failed(dependency: TargetId) -> Self {
        Self::DependencyFailed { dependency }
    }

    pub fn has_succeeded(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn artifacts(&self) -> &[Artifact] {
        match self {
            Self::Success { artifacts } => artifacts,
            _ => &[],
        }
    }

    /// Human readable failure reason; `None` on success.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::Failed { message } => Some(message.clone()),
            Self::DependencyFailed { dependency } => {
                Some(format!("dependency {dependency} did not succeed"))
            }
        }
    }
}

impl fmt::Display for BuildResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { .. } => f.write_str("succeeded"),
            _ => write!(f, "failed: {}", self.message().unwrap_or_default()),
        }
    }
}

/// Final report of a build run, returned by
/// [`execute_targets`](crate::executor::execute_targets).
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub build_id: String,
    pub started_at: DateTime<Local>,
    pub duration_ms: u64,
    /// Canonical target id -> result, ordered for stable reports.
    pub results: BTreeMap<String, BuildResult>,
}

impl BuildSummary {
    pub fn new(
        build_id: String,
        started_at: DateTime<Local>,
        duration: Duration,
        results: BTreeMap<String, BuildResult>,
    ) -> Self {
        Self {
            build_id,
            started_at,
            duration_ms: duration.as_millis() as u64,
            results,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.results.values().all(BuildResult::has_succeeded)
    }

    /// Targets whose own action failed (dependency skips excluded).
    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, BuildResult::Failed { .. }))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, BuildResult::DependencyFailed { .. }))
            .map(|(id, _)| id.as_str())
            .collect()
    }
}
