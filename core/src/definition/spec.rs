use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::actions::{
    BuildDockerImage, CopyFile, FileContent, Group, KustomizeApply, NoOp, PutFile,
    PutRuntimeConfiguration, RunCommand, Settings,
};
use crate::executor::{Action, TargetId};

use super::generators::GeneratorsSpec;
use super::loader::DefinitionDefaults;

/// Contents of one `build.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionFile {
    #[serde(default)]
    pub generators: GeneratorsSpec,

    #[serde(default, rename = "target")]
    pub targets: Vec<TargetSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSpec {
    pub name: String,

    /// `NAME` for a sibling target, `REL_DIR:NAME` for one in another directory.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub action: ActionSpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ActionSpec {
    #[default]
    Noop,
    Command {
        command: Vec<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    CopyFile {
        source: PathBuf,
        destination: PathBuf,
    },
    PutFile {
        path: PathBuf,
        content: String,
        /// Resolve `${artifact:..}` placeholders in `content`.
        #[serde(default)]
        template: bool,
    },
    PutRuntimeConfiguration {
        #[serde(default = "default_runtime_configuration")]
        path: PathBuf,
        #[serde(default)]
        settings: Settings,
    },
    Group {
        actions: Vec<ActionSpec>,
    },
    DockerImage {
        artifact: String,
        image: String,
        #[serde(default = "default_docker_context")]
        context: PathBuf,
        #[serde(default = "default_dockerfile")]
        dockerfile: PathBuf,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    KustomizeApply {
        overlay: PathBuf,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

fn default_runtime_configuration() -> PathBuf {
    PathBuf::from("runtime.configuration.json")
}

fn default_docker_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_dockerfile() -> PathBuf {
    PathBuf::from("Dockerfile")
}

impl ActionSpec {
    /// Turn the declaration into an executable action; errors are messages
    /// for the definition parse error.
    pub fn build(&self, defaults: &DefinitionDefaults) -> Result<Arc<dyn Action>, String> {
        let timeout =
            |secs: &Option<u64>| secs.map(Duration::from_secs).unwrap_or(defaults.timeout);

        let action: Arc<dyn Action> = match self {
            Self::Noop => Arc::new(NoOp),
            Self::Command {
                command,
                timeout_secs,
                env,
            } => {
                if command.is_empty() {
                    return Err("command action needs a non-empty `command`".to_string());
                }
                Arc::new(
                    RunCommand::new(command.clone(), timeout(timeout_secs)).with_env(env.clone()),
                )
            }
            Self::CopyFile {
                source,
                destination,
            } => Arc::new(CopyFile::new(source.clone(), destination.clone())),
            Self::PutFile {
                path,
                content,
                template,
            } => {
                let content = if *template {
                    FileContent::Template(content.clone())
                } else {
                    FileContent::Static(content.clone())
                };
                Arc::new(PutFile::new(path.clone(), content))
            }
            Self::PutRuntimeConfiguration { path, settings } => Arc::new(
                PutRuntimeConfiguration::new(path.clone(), settings.clone()),
            ),
            Self::Group { actions } => Arc::new(Group::new(
                actions
                    .iter()
                    .map(|spec| spec.build(defaults))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Self::DockerImage {
                artifact,
                image,
                context,
                dockerfile,
                timeout_secs,
            } => Arc::new(BuildDockerImage::new(
                artifact.clone(),
                image.clone(),
                context.clone(),
                dockerfile.clone(),
                timeout(timeout_secs),
            )),
            Self::KustomizeApply {
                overlay,
                timeout_secs,
            } => Arc::new(KustomizeApply::new(overlay.clone(), timeout(timeout_secs))),
        };

        Ok(action)
    }
}

/// Resolve a dependency reference written in the definition of `directory`.
pub fn parse_dependency(directory: &Path, reference: &str) -> TargetId {
    match reference.rsplit_once(':') {
        Some((dir, name)) => TargetId::new(directory.join(dir), name),
        None => TargetId::new(directory, reference),
    }
}
