use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;
use crate::executor::{Action, BuildResult, ExecutionContext, TargetOutput};

type ContentFn = dyn Fn(&ExecutionContext, &Path) -> Result<String, ActionError> + Send + Sync;

/// What [`PutFile`] writes.
#[derive(Clone)]
pub enum FileContent {
    Static(String),
    /// Text with `${artifact:KEY}` / `${artifact:DIR:KEY}` placeholders.
    /// `DIR` is relative to the target directory; without it the target
    /// directory itself is searched.
    Template(String),
    /// Computed from the context and working directory at execution time.
    Dynamic(Arc<ContentFn>),
}

impl fmt::Debug for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(s) => f.debug_tuple("Static").field(s).finish(),
            Self::Template(s) => f.debug_tuple("Template").field(s).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Writes a file, typically a manifest that embeds artifacts of dependencies.
#[derive(Debug, Clone)]
pub struct PutFile {
    path: PathBuf,
    content: FileContent,
}

impl PutFile {
    pub fn new(path: impl Into<PathBuf>, content: FileContent) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }

    fn render(
        &self,
        context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<String, ActionError> {
        match &self.content {
            FileContent::Static(text) => Ok(text.clone()),
            FileContent::Template(text) => render_template(text, context, working_directory),
            FileContent::Dynamic(f) => f(context, working_directory),
        }
    }
}

#[async_trait]
impl Action for PutFile {
    async fn execute(
        &self,
        _output: &dyn TargetOutput,
        context: &ExecutionContext,
        working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let content = self.render(context, working_directory)?;
        let path = working_directory.join(&self.path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(BuildResult::ok(vec![]))
    }
}

const PLACEHOLDER_PREFIX: &str = "artifact:";

fn render_template(
    template: &str,
    context: &ExecutionContext,
    working_directory: &Path,
) -> Result<String, ActionError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            ActionError::InvalidTemplate(format!(
                "unterminated placeholder at `{}`",
                &rest[start..]
            ))
        })?;
        let placeholder = after[..end].trim();
        let reference = placeholder.strip_prefix(PLACEHOLDER_PREFIX).ok_or_else(|| {
            ActionError::InvalidTemplate(format!("unknown placeholder `${{{placeholder}}}`"))
        })?;

        let (directory, key) = match reference.rsplit_once(':') {
            Some((dir, key)) => (working_directory.join(dir), key),
            None => (working_directory.to_path_buf(), reference),
        };
        let artifact = context
            .artifacts()
            .get_by_key(&directory, key)
            .ok_or_else(|| ActionError::MissingArtifact {
                scope: directory.display().to_string(),
                key: key.to_string(),
            })?;
        out.push_str(&artifact.value);

        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
