#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use monobuild_core::api::{
    Action, ActionError, Artifact, BuildResult, ExecutionContext, ExecutionEvent,
    ExecutionObserver, Target, TargetId, TargetOutput,
};

pub const REPO: &str = "/repo";

/// Route scheduler logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn id(name: &str) -> TargetId {
    TargetId::new(REPO, name)
}

pub fn target(name: &str, action: Arc<dyn Action>, deps: &[&str]) -> (TargetId, Target) {
    (id(name), Target::new(name, action, deps.iter().map(|d| id(d))))
}

pub fn source(targets: Vec<(TargetId, Target)>) -> HashMap<TargetId, Target> {
    targets.into_iter().collect()
}

/// Writes each chunk, suspending after every one, then returns `result`.
#[derive(Debug)]
pub struct Scripted {
    chunks: Vec<String>,
    result: BuildResult,
    pub calls: AtomicUsize,
}

impl Scripted {
    pub fn ok(chunks: &[&str], artifacts: &[(&str, &str)]) -> Arc<Self> {
        Self::with_result(
            chunks,
            BuildResult::ok(
                artifacts
                    .iter()
                    .map(|(k, v)| Artifact::new(*k, *v))
                    .collect(),
            ),
        )
    }

    pub fn failing(chunks: &[&str], message: &str) -> Arc<Self> {
        Self::with_result(chunks, BuildResult::failed(message))
    }

    fn with_result(chunks: &[&str], result: BuildResult) -> Arc<Self> {
        Arc::new(Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            result,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Action for Scripted {
    async fn execute(
        &self,
        output: &dyn TargetOutput,
        _context: &ExecutionContext,
        _working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        for chunk in &self.chunks {
            output.push_output(chunk);
            tokio::task::yield_now().await;
        }
        Ok(self.result.clone())
    }
}

/// Tracks how many gauged actions are inside `execute` at the same time.
#[derive(Debug, Default)]
pub struct ConcurrencyGauge {
    live: AtomicUsize,
    peak: AtomicUsize,
    finished: AtomicUsize,
}

impl ConcurrencyGauge {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct Gauged {
    gauge: Arc<ConcurrencyGauge>,
    suspensions: usize,
}

impl Gauged {
    pub fn new(gauge: &Arc<ConcurrencyGauge>, suspensions: usize) -> Arc<Self> {
        Arc::new(Self {
            gauge: Arc::clone(gauge),
            suspensions,
        })
    }
}

#[async_trait]
impl Action for Gauged {
    async fn execute(
        &self,
        _output: &dyn TargetOutput,
        _context: &ExecutionContext,
        _working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let live = self.gauge.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(live, Ordering::SeqCst);
        for _ in 0..self.suspensions {
            tokio::task::yield_now().await;
        }
        self.gauge.live.fetch_sub(1, Ordering::SeqCst);
        self.gauge.finished.fetch_add(1, Ordering::SeqCst);
        Ok(BuildResult::ok(vec![]))
    }
}

/// Records what an artifact lookup by directory returned at execution time.
#[derive(Debug)]
pub struct ReadArtifact {
    directory: PathBuf,
    key: String,
    pub seen: Mutex<Option<String>>,
}

impl ReadArtifact {
    pub fn new(directory: impl Into<PathBuf>, key: &str) -> Arc<Self> {
        Arc::new(Self {
            directory: directory.into(),
            key: key.to_string(),
            seen: Mutex::new(None),
        })
    }

    pub fn seen(&self) -> Option<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Action for ReadArtifact {
    async fn execute(
        &self,
        output: &dyn TargetOutput,
        context: &ExecutionContext,
        _working_directory: &Path,
    ) -> Result<BuildResult, ActionError> {
        let value = context
            .artifacts()
            .get_by_key(&self.directory, &self.key)
            .map(|a| a.value);
        output.push_output(&format!("{}={:?}", self.key, value));
        *self.seen.lock().unwrap() = value;
        Ok(BuildResult::ok(vec![]))
    }
}

/// Observer keeping a flat log like `started /repo:a`.
#[derive(Debug, Default)]
pub struct EventLog {
    lines: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ExecutionObserver for EventLog {
    fn on_event(&self, event: &ExecutionEvent<'_>) {
        let line = match event {
            ExecutionEvent::Started { id } => format!("started {id}"),
            ExecutionEvent::Skipped { id, .. } => format!("skipped {id}"),
            ExecutionEvent::Finished { id, result, .. } => format!("finished {id} {result}"),
        };
        self.lines.lock().unwrap().push(line);
    }
}
