use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::{Action, BuildResult, ExecutionContext, TargetOutput};
use crate::runner::InActionProcess;

/// Applies a kustomize overlay with `kubectl apply -k`.
#[derive(Debug, Clone)]
pub struct KustomizeApply {
    overlay: PathBuf,
    timeout: Duration,
}

impl KustomizeApply {
    pub fn new(overlay: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            overlay: overlay.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Action for KustomizeApply {
    async fn execute(
        &self,
        output: &dyn TargetOutput,
        _context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let command = vec![
            "kubectl".to_string(),
            "apply".to_string(),
            "-k".to_string(),
            self.overlay.display().to_string(),
        ];
        let outcome = InActionProcess::new(working_directory, command, self.timeout)
            .run(output)
            .await?;

        if outcome.success() {
            Ok(BuildResult::ok(vec![]))
        } else {
            Ok(BuildResult::failed(outcome.failure_message()))
        }
    }
}
