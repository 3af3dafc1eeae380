use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::{Action, Artifact, BuildResult, ExecutionContext, TargetOutput};
use crate::runner::InActionProcess;

/// Builds a docker image tagged with the build id and publishes the full
/// image reference as an artifact.
#[derive(Debug, Clone)]
pub struct BuildDockerImage {
    artifact_key: String,
    image_name: String,
    context: PathBuf,
    dockerfile: PathBuf,
    timeout: Duration,
}

impl BuildDockerImage {
    pub fn new(
        artifact_key: impl Into<String>,
        image_name: impl Into<String>,
        context: impl Into<PathBuf>,
        dockerfile: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            artifact_key: artifact_key.into(),
            image_name: image_name.into(),
            context: context.into(),
            dockerfile: dockerfile.into(),
            timeout,
        }
    }

    pub fn image_reference(&self, build_id: &str) -> String {
        format!("{}:{}", self.image_name, build_id)
    }

    fn command(&self, image: &str) -> Vec<String> {
        vec![
            "docker".to_string(),
            "build".to_string(),
            "-t".to_string(),
            image.to_string(),
            "-f".to_string(),
            self.dockerfile.display().to_string(),
            self.context.display().to_string(),
        ]
    }
}

#[async_trait]
impl Action for BuildDockerImage {
    async fn execute(
        &self,
        output: &dyn TargetOutput,
        context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let image = self.image_reference(&context.facts().build_id);
        let outcome = InActionProcess::new(working_directory, self.command(&image), self.timeout)
            .run(output)
            .await?;

        if !outcome.success() {
            return Ok(BuildResult::failed(outcome.failure_message()));
        }
        Ok(BuildResult::ok(vec![Artifact::new(&self.artifact_key, image)]))
    }
}
