use std::path::Path;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::{Action, BuildResult, ExecutionContext, TargetOutput};

/// Does nothing; useful for aggregate targets that only carry dependencies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoOp;

#[async_trait]
impl Action for NoOp {
    async fn execute(
        &self,
        _output: &dyn TargetOutput,
        _context: &ExecutionContext,
        _working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        Ok(BuildResult::ok(vec![]))
    }
}
