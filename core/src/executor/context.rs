use std::sync::Arc;

use super::artifacts::ArtifactCollector;
use super::types::BuildFacts;

/// What an action can see of the build while it runs.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    artifacts: ArtifactCollector,
    facts: Arc<BuildFacts>,
}

impl ExecutionContext {
    pub fn new(artifacts: ArtifactCollector, facts: BuildFacts) -> Self {
        Self {
            artifacts,
            facts: Arc::new(facts),
        }
    }

    pub fn artifacts(&self) -> &ArtifactCollector {
        &self.artifacts
    }

    pub fn facts(&self) -> &BuildFacts {
        &self.facts
    }
}
