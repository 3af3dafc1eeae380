//! CI-style console rendering: every output line is echoed with a coloured
//! `[O]` / `[E]` prefix, and target starts and results are announced.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossterm::style::{Color, Stylize};
use monobuild_core::api::{
    BuildResult, CollectedOutput, ExecutionEvent, ExecutionObserver, OutputFactory, SharedOutput,
    TargetId, TargetOutput,
};

const STDOUT_PREFIX: &str = "[O]";
const STDERR_PREFIX: &str = "[E]";

/// Insert `prefix ` at the start of every line of `data`. `at_line_start`
/// carries the line state over to the next chunk of the same stream.
pub fn prefix_chunk(data: &str, prefix: &str, at_line_start: &mut bool) -> String {
    let mut out = String::with_capacity(data.len() + prefix.len() + 1);
    for piece in data.split_inclusive('\n') {
        if *at_line_start {
            out.push_str(prefix);
            out.push(' ');
        }
        out.push_str(piece);
        *at_line_start = piece.ends_with('\n');
    }
    out
}

fn write_stdout(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        tracing::debug!(error = %e, "writing to stdout failed");
    }
}

#[derive(Debug, Clone, Copy)]
struct LineState {
    stdout: bool,
    stderr: bool,
}

/// Sink that echoes a target's output to the console while collecting it.
pub struct ConsoleOutput {
    inner: CollectedOutput,
    lines: Mutex<LineState>,
    stdout_prefix: String,
    stderr_prefix: String,
}

impl ConsoleOutput {
    pub fn new(color: bool) -> Self {
        let (stdout_prefix, stderr_prefix) = if color {
            (
                STDOUT_PREFIX.cyan().to_string(),
                STDERR_PREFIX.red().to_string(),
            )
        } else {
            (STDOUT_PREFIX.to_string(), STDERR_PREFIX.to_string())
        };
        Self {
            inner: CollectedOutput::new(),
            lines: Mutex::new(LineState {
                stdout: true,
                stderr: true,
            }),
            stdout_prefix,
            stderr_prefix,
        }
    }

    fn echo(&self, chunk: &str, stderr: bool) {
        if self.inner.is_finalized() {
            return;
        }
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        let text = if stderr {
            prefix_chunk(chunk, &self.stderr_prefix, &mut lines.stderr)
        } else {
            prefix_chunk(chunk, &self.stdout_prefix, &mut lines.stdout)
        };
        write_stdout(&text);
    }
}

impl TargetOutput for ConsoleOutput {
    fn push_output(&self, chunk: &str) {
        self.echo(chunk, false);
        self.inner.push_output(chunk);
    }

    fn push_error(&self, chunk: &str) {
        self.echo(chunk, true);
        self.inner.push_error(chunk);
    }

    fn finalize(&self, result: &BuildResult) {
        let lines = *self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if !lines.stdout || !lines.stderr {
            write_stdout("\n");
        }
        self.inner.finalize(result);
    }

    fn collected_stdout(&self) -> String {
        self.inner.collected_stdout()
    }

    fn collected_stderr(&self) -> String {
        self.inner.collected_stderr()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConsoleOutputFactory {
    pub color: bool,
}

impl OutputFactory for ConsoleOutputFactory {
    fn create(&self, _id: &TargetId) -> SharedOutput {
        Arc::new(ConsoleOutput::new(self.color))
    }
}

/// Announces `(i/n) Running target ..` or `(i/n) Skipped target ..` for
/// every target, then each outcome. Runs and skips share the counter so it
/// ends at `n`.
pub struct ConsoleObserver {
    total: usize,
    announced: AtomicUsize,
    color: bool,
}

impl ConsoleObserver {
    pub fn new(total: usize, color: bool) -> Self {
        Self {
            total,
            announced: AtomicUsize::new(0),
            color,
        }
    }

    fn next_position(&self) -> usize {
        self.announced.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn announcement(&self, event: &ExecutionEvent<'_>) -> (String, Color) {
        match event {
            ExecutionEvent::Started { id } => (
                format!("({}/{}) Running target {id}", self.next_position(), self.total),
                Color::Cyan,
            ),
            ExecutionEvent::Skipped { id, result } => (
                format!(
                    "({}/{}) Skipped target {id}: {result}",
                    self.next_position(),
                    self.total
                ),
                Color::Yellow,
            ),
            ExecutionEvent::Finished { result, .. } if result.has_succeeded() => {
                (result.to_string(), Color::Green)
            }
            ExecutionEvent::Finished { result, .. } => (result.to_string(), Color::Red),
        }
    }
}

impl ExecutionObserver for ConsoleObserver {
    fn on_event(&self, event: &ExecutionEvent<'_>) {
        let (text, color) = self.announcement(event);
        if self.color {
            write_stdout(&format!("{}\n", text.with(color)));
        } else {
            write_stdout(&format!("{text}\n"));
        }
    }
}
