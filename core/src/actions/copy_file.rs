use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::{Action, BuildResult, ExecutionContext, TargetOutput};

/// Copies `source` to `destination`, both relative to the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFile {
    source: PathBuf,
    destination: PathBuf,
}

impl CopyFile {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

#[async_trait]
impl Action for CopyFile {
    async fn execute(
        &self,
        _output: &dyn TargetOutput,
        _context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let destination = working_directory.join(&self.destination);
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(working_directory.join(&self.source), &destination)?;
        Ok(BuildResult::ok(vec![]))
    }
}
