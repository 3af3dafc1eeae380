//! Cooperative target scheduler
//!
//! This module turns a set of targets and their dependency edges into a
//! concurrency-bounded execution. It supports:
//! - Dependency closure resolution and validation (missing targets, cycles)
//! - Lazy, dependency-driven execution with a maximum degree of parallelism
//! - Failure propagation (`DependencyFailed`) without halting unrelated targets
//! - Per-target output sinks and a build-wide artifact registry
//!
//! # Architecture
//!
//! ```text
//! requested TargetIds
//!   ↓
//! TargetGraph::resolve(source) → validate() → execution_order()
//!   ↓
//! TargetExecutor::add_target() for each, in order
//!   ↓  (waits on dependencies / free slots by resuming running units)
//! TargetExecutor::wait_for_all() → BuildSummary
//! ```

mod artifacts;
mod context;
mod engine;
mod graph;
mod output;
mod scheduler;
pub mod traits;
pub mod types;

pub use artifacts::ArtifactCollector;
pub use context::ExecutionContext;
pub use engine::{execute_requested, execute_targets};
pub use graph::{TargetGraph, TargetSource};
pub use output::{
    CollectedOutput, CollectingOutputFactory, OutputChunk, OutputFactory, OutputStream,
    SharedOutput, TargetOutput,
};
pub use scheduler::{TargetExecutor, TargetRecord};
pub use traits::{Action, ExecutionEvent, ExecutionObserver};
pub use types::{
    Artifact, BuildFacts, BuildResult, BuildSummary, ExecutionOpts, Target, TargetId,
};
