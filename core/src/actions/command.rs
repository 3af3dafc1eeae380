use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::{Action, BuildResult, ExecutionContext, TargetOutput};
use crate::runner::InActionProcess;

/// Runs a command in the target's directory.
#[derive(Debug, Clone)]
pub struct RunCommand {
    command: Vec<String>,
    timeout: Duration,
    env: HashMap<String, String>,
}

impl RunCommand {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self {
            command,
            timeout,
            env: HashMap::new(),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

#[async_trait]
impl Action for RunCommand {
    async fn execute(
        &self,
        output: &dyn TargetOutput,
        _context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let outcome = InActionProcess::new(working_directory, self.command.clone(), self.timeout)
            .with_env(self.env.clone())
            .run(output)
            .await?;

        if outcome.success() {
            Ok(BuildResult::ok(vec![]))
        } else {
            Ok(BuildResult::failed(outcome.failure_message()))
        }
    }
}
