use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;

use crate::error::ExecutorError;

use super::artifacts::ArtifactCollector;
use super::context::ExecutionContext;
use super::graph::{TargetGraph, TargetSource};
use super::output::OutputFactory;
use super::scheduler::TargetExecutor;
use super::traits::ExecutionObserver;
use super::types::{BuildFacts, BuildSummary, ExecutionOpts, TargetId};

/// Resolve the requested targets from `source` and run them.
pub async fn execute_requested<S: TargetSource + ?Sized>(
    source: &mut S,
    requested: &[TargetId],
    opts: &ExecutionOpts,
    outputs: &dyn OutputFactory,
    observers: &[Arc<dyn ExecutionObserver>],
) -> Result<BuildSummary, ExecutorError> {
    let graph = TargetGraph::resolve(source, requested)?;
    execute_targets(&graph, opts, outputs, observers).await
}

/// Run every target of `graph`.
///
/// Targets are added to a fresh [`TargetExecutor`] in dependency-first order,
/// then the executor is drained. Target failures are reported in the
/// summary, never as `Err`.
pub async fn execute_targets(
    graph: &TargetGraph,
    opts: &ExecutionOpts,
    outputs: &dyn OutputFactory,
    observers: &[Arc<dyn ExecutionObserver>],
) -> Result<BuildSummary, ExecutorError> {
    graph.validate()?;

    let started_at = Local::now();
    let timer = Instant::now();
    let facts = BuildFacts::from_opts(opts);
    let artifacts = ArtifactCollector::new();
    let context = ExecutionContext::new(artifacts.clone(), facts.clone());

    let order = graph.execution_order();
    tracing::info!(
        build_id = %facts.build_id,
        targets = order.len(),
        max_parallelism = facts.max_parallelism,
        "Starting build"
    );

    let mut executor = TargetExecutor::new(facts.max_parallelism, artifacts);
    for observer in observers {
        executor = executor.with_observer(Arc::clone(observer));
    }

    for id in &order {
        let Some(target) = graph.get(id) else {
            continue;
        };
        executor
            .add_target(id.clone(), target, outputs.create(id), context.clone())
            .await?;
    }

    let results: BTreeMap<String, _> = executor
        .wait_for_all()
        .await
        .iter()
        .map(|(key, record)| (key.clone(), record.result.clone()))
        .collect();

    let summary = BuildSummary::new(facts.build_id, started_at, timer.elapsed(), results);
    tracing::info!(
        duration_ms = summary.duration_ms,
        failed = summary.failed().len(),
        skipped = summary.skipped().len(),
        peak_running = executor.peak_running(),
        "Build finished"
    );

    Ok(summary)
}
