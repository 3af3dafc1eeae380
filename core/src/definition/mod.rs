//! Per-directory build definitions (`build.toml`).

mod generators;
mod loader;
mod spec;

pub use generators::{
    GeneratorsSpec, PhpTargets, RustTargets, TargetGenerator, BUILD_TARGET,
};
pub use loader::{BuildDefinition, DefinitionDefaults, DefinitionLoader, DEFAULT_DEFINITION_FILE};
pub use spec::{parse_dependency, ActionSpec, DefinitionFile, TargetSpec};
