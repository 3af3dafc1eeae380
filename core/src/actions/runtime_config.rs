use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;

use crate::error::ActionError;
use crate::executor::{Action, BuildResult, ExecutionContext, TargetOutput};

pub type Settings = BTreeMap<String, serde_json::Value>;

/// Writes the JSON configuration a service reads at startup: the identity
/// of the build that produced it plus the settings declared for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PutRuntimeConfiguration {
    path: PathBuf,
    settings: Settings,
}

#[derive(Debug, Serialize)]
struct RuntimeConfiguration<'a> {
    build_id: &'a str,
    ci: bool,
    settings: &'a Settings,
}

impl PutRuntimeConfiguration {
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    fn render(&self, context: &ExecutionContext) -> Result<String, ActionError> {
        let facts = context.facts();
        let document = RuntimeConfiguration {
            build_id: &facts.build_id,
            ci: facts.ci,
            settings: &self.settings,
        };
        let mut json =
            serde_json::to_string_pretty(&document).context("serializing runtime configuration")?;
        json.push('\n');
        Ok(json)
    }
}

#[async_trait]
impl Action for PutRuntimeConfiguration {
    async fn execute(
        &self,
        _output: &dyn TargetOutput,
        context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let json = self.render(context)?;
        let path = working_directory.join(&self.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, json)?;
        tracing::debug!(path = %path.display(), "runtime configuration written");
        Ok(BuildResult::ok(vec![]))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::executor::{ArtifactCollector, BuildFacts, CollectedOutput};

    #[tokio::test]
    async fn writes_build_identity_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        let facts = BuildFacts {
            build_id: "b-42".to_string(),
            ..BuildFacts::default()
        };
        let context = ExecutionContext::new(ArtifactCollector::new(), facts);
        let settings: Settings = [
            ("log_level".to_string(), json!("info")),
            ("watch".to_string(), json!(["/srv/data"])),
        ]
        .into();

        let result = PutRuntimeConfiguration::new("config/runtime.configuration.json", settings)
            .execute(&CollectedOutput::new(), &context, dir.path())
            .await
            .unwrap();

        assert!(result.has_succeeded());
        let written: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("config/runtime.configuration.json"))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(
            written,
            json!({
                "build_id": "b-42",
                "ci": false,
                "settings": { "log_level": "info", "watch": ["/srv/data"] },
            })
        );
    }
}
