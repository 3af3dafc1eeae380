//! Command implementations: merge CLI flags into the configuration, load
//! definitions, run the build with the right renderer.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use monobuild_core::api::{
    execute_targets, parse_dependency, AppConfig, BuildSummary, CollectingOutputFactory,
    DefinitionDefaults, DefinitionLoader, ExecutionObserver, ExecutionOpts, ExecutorConfig,
    TargetGraph, TargetId,
};

use crate::commands::cli::{BuildArgs, ListArgs};
use crate::error::CliError;
use crate::progress::ProgressMonitor;
use crate::render::{ConsoleObserver, ConsoleOutputFactory};

fn loader_for(cfg: &ExecutorConfig) -> DefinitionLoader {
    DefinitionLoader::new(
        cfg.definition_file.clone(),
        DefinitionDefaults::from_config(cfg),
    )
}

fn absolute(dir: &Path) -> Result<PathBuf, CliError> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(dir))
    }
}

/// Apply command-line overrides on top of the loaded executor configuration.
pub fn merge_build_args(
    cfg: &ExecutorConfig,
    args: &BuildArgs,
    stdout_is_tty: bool,
) -> ExecutorConfig {
    let mut merged = cfg.clone();
    if let Some(n) = args.parallelism {
        merged.max_parallelism = Some(n as usize);
    }
    if let Some(secs) = args.timeout {
        merged.default_timeout_secs = secs;
    }
    merged.ci = args.ci || cfg.ci || !stdout_is_tty;
    merged
}

/// Turn `NAME` / `DIR:NAME` arguments into identities; all targets of `cwd`
/// when none are given.
pub fn requested_targets(
    loader: &mut DefinitionLoader,
    cwd: &Path,
    targets: &[String],
) -> Result<Vec<TargetId>, CliError> {
    if targets.is_empty() {
        return Ok(loader
            .target_names(cwd)?
            .into_iter()
            .map(|name| TargetId::new(cwd, name))
            .collect());
    }
    Ok(targets.iter().map(|r| parse_dependency(cwd, r)).collect())
}

#[tracing::instrument(name = "cli.build", skip_all)]
pub async fn run_build(args: BuildArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let stdout_is_tty = atty::is(atty::Stream::Stdout);
    let executor_cfg = merge_build_args(&cfg.executor, &args, stdout_is_tty);
    let opts = ExecutionOpts::from_config(&executor_cfg);
    let cwd = std::env::current_dir()?;

    let mut loader = loader_for(&executor_cfg);
    let requested = requested_targets(&mut loader, &cwd, &args.targets)?;
    let graph = TargetGraph::resolve(&mut loader, &requested)?;
    let total = graph.len();
    tracing::debug!(
        requested = requested.len(),
        total,
        ci = executor_cfg.ci,
        "targets resolved"
    );

    let summary = if executor_cfg.ci {
        let color = stdout_is_tty || args.ci || cfg.executor.ci;
        let observers: Vec<Arc<dyn ExecutionObserver>> =
            vec![Arc::new(ConsoleObserver::new(total, color)) as Arc<dyn ExecutionObserver>];
        execute_targets(&graph, &opts, &ConsoleOutputFactory { color }, &observers).await?
    } else {
        let monitor = Arc::new(ProgressMonitor::new(total, atty::is(atty::Stream::Stderr)));
        let observers: Vec<Arc<dyn ExecutionObserver>> =
            vec![monitor.clone() as Arc<dyn ExecutionObserver>];
        let summary = execute_targets(&graph, &opts, &CollectingOutputFactory, &observers).await?;
        monitor.finish(summary.succeeded());
        summary
    };

    print_summary(&summary);
    if let Some(path) = &args.report {
        write_report(path, &summary)?;
    }

    Ok(if summary.succeeded() { 0 } else { 1 })
}

fn print_summary(summary: &BuildSummary) {
    let failed = summary.failed();
    let skipped = summary.skipped();
    println!(
        "Build {} finished in {}ms: {} succeeded, {} failed, {} skipped",
        summary.build_id,
        summary.duration_ms,
        summary.results.len() - failed.len() - skipped.len(),
        failed.len(),
        skipped.len()
    );
    for id in failed {
        println!("  failed:  {id}");
    }
    for id in skipped {
        println!("  skipped: {id}");
    }
}

pub fn write_report(path: &Path, summary: &BuildSummary) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(summary).context("serializing build report")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), "build report written");
    Ok(())
}

pub fn run_list(args: ListArgs, cfg: &AppConfig) -> Result<i32, CliError> {
    let root = absolute(&args.dir)?;
    let mut loader = loader_for(&cfg.executor);

    let dirs = if args.recursive {
        discover_definition_dirs(&root, &cfg.executor.definition_file)?
    } else {
        vec![root]
    };

    for dir in dirs {
        for name in loader.target_names(&dir)? {
            println!("{}", TargetId::new(&dir, name));
        }
    }
    Ok(0)
}

/// Every directory below `root` (inclusive) holding a `file_name`, sorted.
pub fn discover_definition_dirs(root: &Path, file_name: &str) -> Result<Vec<PathBuf>, CliError> {
    let pattern = format!(
        "{}/**/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        glob::Pattern::escape(file_name)
    );
    let mut dirs: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| CliError::Config(format!("invalid definition file name: {e}")))?
        .filter_map(|entry| match entry {
            Ok(path) => path.parent().map(Path::to_path_buf),
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .collect();
    dirs.sort();
    dirs.dedup();
    Ok(dirs)
}
