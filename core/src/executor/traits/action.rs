use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::context::ExecutionContext;
use crate::executor::output::TargetOutput;
use crate::executor::types::BuildResult;

/// The executable behaviour bound to a target.
///
/// Actions doing blocking I/O must await it (each await on subprocess output
/// is a point where the scheduler may resume other targets). Actions without
/// I/O may simply return.
///
/// An `Err` is recorded by the scheduler as [`BuildResult::Failed`].
#[async_trait]
pub trait Action: Send + Sync + fmt::Debug {
    async fn execute(
        &self,
        output: &dyn TargetOutput,
        context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError>;
}
