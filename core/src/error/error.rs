use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("empty command")]
    EmptyCommand,
    #[error("spawn failed: `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("stream io error: {stream} {source}")]
    StreamIo {
        stream: &'static str,
        source: std::io::Error,
    },
    #[error("waiting for `{command}` failed: {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },
    #[error("command `{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },
}

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Process(#[from] ProcessError),
    #[error("artifact '{key}' not found for {scope}")]
    MissingArtifact { scope: String, key: String },
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("artifact '{key}' was already collected for target {producer}")]
    AlreadyCollected { producer: String, key: String },
}

#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("no build definition found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid build definition {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("duplicate target '{name}' in {path}")]
    DuplicateTarget { path: PathBuf, name: String },
    #[error("unknown target '{0}'")]
    UnknownTarget(String),
    #[error("invalid target id '{0}': expected PATH:TARGET")]
    InvalidTargetId(String),
}
