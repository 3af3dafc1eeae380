use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::executor::traits::Action;

/// Identity of a target: the directory that defines it plus its name.
///
/// The canonical string form is `PATH:TARGET`; it is what the scheduler uses
/// as a map key and what [`FromStr`] parses back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TargetId {
    path: PathBuf,
    target: String,
}

impl TargetId {
    pub fn new(path: impl AsRef<Path>, target: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path.as_ref()),
            target: target.into(),
        }
    }

    /// Directory the target is defined in; also its working directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.target)
    }
}

impl FromStr for TargetId {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((path, target)) if !path.is_empty() && !target.is_empty() => {
                Ok(Self::new(path, target))
            }
            _ => Err(DefinitionError::InvalidTargetId(s.to_string())),
        }
    }
}

impl From<TargetId> for String {
    fn from(id: TargetId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TargetId {
    type Error = DefinitionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lexically normalise a path: drop `.`, fold `..` into its parent and strip
/// trailing separators. The filesystem is never consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// A named unit of build work: an action plus the targets it depends on.
#[derive(Clone)]
pub struct Target {
    name: String,
    action: Arc<dyn Action>,
    dependencies: Vec<TargetId>,
}

impl Target {
    /// Repeated dependencies are collapsed, keeping the first occurrence.
    pub fn new(
        name: impl Into<String>,
        action: Arc<dyn Action>,
        dependencies: impl IntoIterator<Item = TargetId>,
    ) -> Self {
        let mut unique: Vec<TargetId> = Vec::new();
        for dep in dependencies {
            if !unique.contains(&dep) {
                unique.push(dep);
            }
        }

        Self {
            name: name.into(),
            action,
            dependencies: unique,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &Arc<dyn Action> {
        &self.action
    }

    pub fn dependencies(&self) -> &[TargetId] {
        &self.dependencies
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::NoOp;

    #[test]
    fn canonical_form_round_trips() {
        let id = TargetId::new("services/events", "build");
        assert_eq!(id.to_string(), "services/events:build");

        let parsed: TargetId = "services/events:build".parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_splits_on_last_colon() {
        let parsed: TargetId = "C:/repo/services:deploy".parse().unwrap();
        assert_eq!(parsed.target(), "deploy");
        assert_eq!(parsed.path(), Path::new("C:/repo/services"));
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!("build".parse::<TargetId>().is_err());
        assert!(":build".parse::<TargetId>().is_err());
        assert!("services/events:".parse::<TargetId>().is_err());
    }

    #[test]
    fn paths_are_normalized() {
        let a = TargetId::new("/repo/services/directory-watcher/../events/", "deploy");
        let b = TargetId::new("/repo/services/./events", "deploy");
        assert_eq!(a, b);
        assert_eq!(a.path(), Path::new("/repo/services/events"));
    }

    #[test]
    fn normalize_keeps_leading_parent_dirs_of_relative_paths() {
        assert_eq!(normalize_path(Path::new("../a/./b/..")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new("/..")), PathBuf::from("/"));
    }

    #[test]
    fn duplicate_dependencies_are_collapsed_in_declared_order() {
        let a = TargetId::new("/repo", "a");
        let b = TargetId::new("/repo", "b");
        let target = Target::new(
            "c",
            Arc::new(NoOp),
            vec![b.clone(), a.clone(), b.clone()],
        );
        assert_eq!(target.dependencies(), &[b, a]);
    }
}
