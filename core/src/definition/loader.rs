use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ExecutorConfig;
use crate::error::DefinitionError;
use crate::executor::types::normalize_path;
use crate::executor::{Target, TargetId, TargetSource};

use super::generators::BUILD_TARGET;
use super::spec::{parse_dependency, ActionSpec, DefinitionFile, TargetSpec};

pub const DEFAULT_DEFINITION_FILE: &str = "build.toml";

/// Values applied to actions that leave them unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionDefaults {
    pub timeout: Duration,
}

impl Default for DefinitionDefaults {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3600),
        }
    }
}

impl DefinitionDefaults {
    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self {
            timeout: Duration::from_secs(cfg.default_timeout_secs),
        }
    }
}

/// Targets of one directory: declared ones in declaration order, then the
/// generated ones, then a synthesized `build` aggregate if any.
#[derive(Debug, Clone)]
pub struct BuildDefinition {
    targets: Vec<Target>,
}

impl BuildDefinition {
    pub fn target_names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name() == name)
    }
}

/// Loads and caches `build.toml` files by directory.
pub struct DefinitionLoader {
    file_name: String,
    defaults: DefinitionDefaults,
    cache: HashMap<PathBuf, Arc<BuildDefinition>>,
}

impl DefinitionLoader {
    pub fn new(file_name: impl Into<String>, defaults: DefinitionDefaults) -> Self {
        Self {
            file_name: file_name.into(),
            defaults,
            cache: HashMap::new(),
        }
    }

    pub fn load(&mut self, directory: &Path) -> Result<Arc<BuildDefinition>, DefinitionError> {
        let directory = normalize_path(directory);
        if let Some(definition) = self.cache.get(&directory) {
            return Ok(Arc::clone(definition));
        }

        let path = directory.join(&self.file_name);
        if !path.is_file() {
            return Err(DefinitionError::NotFound(path));
        }
        let text = std::fs::read_to_string(&path).map_err(|source| DefinitionError::Read {
            path: path.clone(),
            source,
        })?;
        let definition = Arc::new(self.parse(&directory, &path, &text)?);
        tracing::debug!(
            path = %path.display(),
            targets = definition.targets.len(),
            "build definition loaded"
        );

        self.cache.insert(directory, Arc::clone(&definition));
        Ok(definition)
    }

    fn parse(
        &self,
        directory: &Path,
        path: &Path,
        text: &str,
    ) -> Result<BuildDefinition, DefinitionError> {
        let file: DefinitionFile = toml::from_str(text).map_err(|e| DefinitionError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut specs = file.targets;
        let mut build_dependencies = Vec::new();
        for generator in file.generators.enabled() {
            specs.extend(generator.targets());
            build_dependencies.extend(generator.build_target_names());
        }
        if !build_dependencies.is_empty() {
            match specs.iter_mut().find(|spec| spec.name == BUILD_TARGET) {
                Some(build) => build.dependencies.extend(build_dependencies),
                None => specs.push(TargetSpec {
                    name: BUILD_TARGET.to_string(),
                    dependencies: build_dependencies,
                    action: ActionSpec::Noop,
                }),
            }
        }

        let mut targets: Vec<Target> = Vec::with_capacity(specs.len());
        for spec in specs {
            if targets.iter().any(|t| t.name() == spec.name) {
                return Err(DefinitionError::DuplicateTarget {
                    path: path.to_path_buf(),
                    name: spec.name,
                });
            }
            let action = spec
                .action
                .build(&self.defaults)
                .map_err(|message| DefinitionError::Parse {
                    path: path.to_path_buf(),
                    message: format!("target '{}': {message}", spec.name),
                })?;
            let dependencies = spec
                .dependencies
                .iter()
                .map(|reference| parse_dependency(directory, reference));
            targets.push(Target::new(spec.name.clone(), action, dependencies));
        }

        Ok(BuildDefinition { targets })
    }

    /// Target names declared in `directory`, in declaration order.
    pub fn target_names(&mut self, directory: &Path) -> Result<Vec<String>, DefinitionError> {
        Ok(self.load(directory)?.target_names())
    }
}

impl TargetSource for DefinitionLoader {
    fn target(&mut self, id: &TargetId) -> Result<Target, DefinitionError> {
        let definition = match self.load(id.path()) {
            Ok(definition) => definition,
            Err(DefinitionError::NotFound(_)) => {
                return Err(DefinitionError::UnknownTarget(id.to_string()))
            }
            Err(e) => return Err(e),
        };
        definition
            .get(id.target())
            .cloned()
            .ok_or_else(|| DefinitionError::UnknownTarget(id.to_string()))
    }
}
