//! Stable re-exports for consumers (`cli` and external crates).
//!
//! Prefer importing from `monobuild_core::api` instead of reaching into internal modules.

pub use crate::actions::{
    BuildDockerImage, CopyFile, FileContent, Group, KustomizeApply, NoOp, PutFile,
    PutRuntimeConfiguration, RunCommand, Settings,
};
pub use crate::config::{
    apply_env_overrides, load_default, load_from_path, AppConfig, ExecutorConfig, LoggingConfig,
};
pub use crate::definition::{
    parse_dependency, BuildDefinition, DefinitionDefaults, DefinitionLoader, GeneratorsSpec,
    PhpTargets, RustTargets, TargetGenerator, BUILD_TARGET, DEFAULT_DEFINITION_FILE,
};
pub use crate::error::{ActionError, ArtifactError, DefinitionError, ExecutorError, ProcessError};
pub use crate::executor::{
    execute_requested, execute_targets, Action, Artifact, ArtifactCollector, BuildFacts,
    BuildResult, BuildSummary, CollectedOutput, CollectingOutputFactory, ExecutionContext,
    ExecutionEvent, ExecutionObserver, ExecutionOpts, OutputChunk, OutputFactory, OutputStream,
    SharedOutput, Target, TargetExecutor, TargetGraph, TargetId, TargetOutput, TargetRecord,
    TargetSource,
};
pub use crate::runner::{InActionProcess, ProcessOutcome};
