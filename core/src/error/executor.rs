use thiserror::Error;

use super::error::DefinitionError;

/// Structural errors raised while building or driving the target graph.
///
/// Target failures are not errors: they are recorded as
/// [`BuildResult`](crate::executor::BuildResult) values.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Unknown dependency: target '{target}' depends on '{dependency}', which was never added")]
    UnknownDependency { target: String, dependency: String },

    #[error("Target '{0}' was never added to the build")]
    NotScheduled(String),

    #[error("Dependency not found: target '{target}' depends on '{missing_dep}'")]
    DependencyNotFound { target: String, missing_dep: String },

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Build definition error: {0}")]
    Definition(#[from] DefinitionError),
}

impl ExecutorError {
    /// Process exit code used by the CLI when the build aborts on this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownDependency { .. } => 30,
            Self::NotScheduled(_) => 30,
            Self::DependencyNotFound { .. } => 30,
            Self::CircularDependency(_) => 30,
            Self::Definition(_) => 11,
        }
    }
}
