//! Per-target output sinks.
//!
//! A sink receives raw stdout/stderr chunks while a target runs and is
//! finalized exactly once, by the scheduler, with the target's result.
//! Rendering (prefixes, colours, progress) layers on top of this interface.

use std::sync::{Arc, Mutex, MutexGuard};

use super::types::{BuildResult, TargetId};

/// Sink for one target's output.
///
/// Methods take `&self`: the running unit, the scheduler and the results map
/// all hold the same [`SharedOutput`].
pub trait TargetOutput: Send + Sync {
    fn push_output(&self, chunk: &str);
    fn push_error(&self, chunk: &str);
    /// Signals that no further chunks will arrive.
    fn finalize(&self, result: &BuildResult);
    fn collected_stdout(&self) -> String;
    fn collected_stderr(&self) -> String;
}

pub type SharedOutput = Arc<dyn TargetOutput>;

/// Creates the sink for each target added to a build.
pub trait OutputFactory: Send + Sync {
    fn create(&self, id: &TargetId) -> SharedOutput;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: OutputStream,
    pub data: String,
}

#[derive(Debug, Default)]
struct Collected {
    stdout: String,
    stderr: String,
    chunks: Vec<OutputChunk>,
    result: Option<BuildResult>,
}

/// In-memory sink keeping every chunk in arrival order.
#[derive(Debug, Default)]
pub struct CollectedOutput {
    inner: Mutex<Collected>,
}

impl CollectedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, Collected> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Interleaved stdout/stderr chunks.
    pub fn chunks(&self) -> Vec<OutputChunk> {
        self.lock().chunks.clone()
    }

    pub fn final_result(&self) -> Option<BuildResult> {
        self.lock().result.clone()
    }

    pub fn is_finalized(&self) -> bool {
        self.lock().result.is_some()
    }

    fn push(&self, stream: OutputStream, chunk: &str) {
        if chunk.is_empty() {
            return;
        }
        let mut inner = self.lock();
        if inner.result.is_some() {
            tracing::warn!(stream = ?stream, "output pushed after finalize; dropped");
            return;
        }
        match stream {
            OutputStream::Stdout => inner.stdout.push_str(chunk),
            OutputStream::Stderr => inner.stderr.push_str(chunk),
        }
        inner.chunks.push(OutputChunk {
            stream,
            data: chunk.to_string(),
        });
    }
}

impl TargetOutput for CollectedOutput {
    fn push_output(&self, chunk: &str) {
        self.push(OutputStream::Stdout, chunk);
    }

    fn push_error(&self, chunk: &str) {
        self.push(OutputStream::Stderr, chunk);
    }

    fn finalize(&self, result: &BuildResult) {
        let mut inner = self.lock();
        if inner.result.is_some() {
            tracing::warn!("output finalized twice; keeping the first result");
            return;
        }
        inner.result = Some(result.clone());
    }

    fn collected_stdout(&self) -> String {
        self.lock().stdout.clone()
    }

    fn collected_stderr(&self) -> String {
        self.lock().stderr.clone()
    }
}

/// Factory handing out plain [`CollectedOutput`] sinks.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollectingOutputFactory;

impl OutputFactory for CollectingOutputFactory {
    fn create(&self, _id: &TargetId) -> SharedOutput {
        CollectedOutput::shared()
    }
}
