use monobuild_core::api::{DefinitionError, ExecutorError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Executor(#[from] ExecutorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<DefinitionError> for CliError {
    fn from(e: DefinitionError) -> Self {
        Self::Executor(ExecutorError::Definition(e))
    }
}

impl CliError {
    // 0: success
    // 1: build ran, some target did not succeed (returned as a normal exit code)
    // 11: config or build definition error
    // 20: io error
    // 30: target graph error
    // 50: internal/uncategorized
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 11,
            Self::Executor(e) => e.exit_code(),
            Self::Io(_) => 20,
            Self::Anyhow(_) => 50,
        }
    }
}
