use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::error::ProcessError;
use crate::executor::TargetOutput;

use super::types::ProcessOutcome;

const CHUNK_BYTES: usize = 16 * 1024;
const DRAIN_GRACE: Duration = Duration::from_millis(100);

/// A subprocess run from inside an action, streaming into the target's sink.
///
/// Suspends right after the process starts and after every chunk of output
/// it forwards, so the scheduler can resume other targets in between.
#[derive(Debug, Clone)]
pub struct InActionProcess {
    working_directory: PathBuf,
    command: Vec<String>,
    timeout: Duration,
    env: HashMap<String, String>,
    stdin: Option<String>,
}

impl InActionProcess {
    pub fn new(
        working_directory: impl Into<PathBuf>,
        command: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            working_directory: working_directory.into(),
            command,
            timeout,
            env: HashMap::new(),
            stdin: None,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    pub async fn run(&self, output: &dyn TargetOutput) -> Result<ProcessOutcome, ProcessError> {
        let (program, args) = self.command.split_first().ok_or(ProcessError::EmptyCommand)?;
        let command_line = self.command_line();
        let started_at = Instant::now();

        let mut child = Command::new(program)
            .args(args)
            .envs(&self.env)
            .current_dir(&self.working_directory)
            .stdin(if self.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        tracing::debug!(
            command = %command_line,
            timeout_s = self.timeout.as_secs(),
            "process started"
        );

        if let (Some(input), Some(mut stdin)) = (self.stdin.clone(), child.stdin.take()) {
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    tracing::warn!(error = %e, "writing process stdin failed");
                }
            });
        }

        tokio::task::yield_now().await;

        let streamed =
            tokio::time::timeout(self.timeout, stream_and_wait(&mut child, output)).await;
        let exit_code = match streamed {
            Ok(result) => result.map_err(|e| match e {
                WaitError::Stream(e) => e,
                WaitError::Wait(source) => ProcessError::Wait {
                    command: command_line.clone(),
                    source,
                },
            })?,
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(
                        command = %command_line,
                        error = %e,
                        "killing timed out process failed"
                    );
                }
                return Err(ProcessError::Timeout {
                    command: command_line,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        Ok(ProcessOutcome {
            command: command_line,
            exit_code,
            duration_ms: started_at.elapsed().as_millis() as u64,
        })
    }
}

enum WaitError {
    Stream(ProcessError),
    Wait(std::io::Error),
}

async fn stream_and_wait(
    child: &mut Child,
    output: &dyn TargetOutput,
) -> Result<Option<i32>, WaitError> {
    let mut stdout = Pump::new("stdout", child.stdout.take());
    let mut stderr = Pump::new("stderr", child.stderr.take());
    let wait = child.wait();
    tokio::pin!(wait);

    let status = loop {
        tokio::select! {
            read = stdout.read(), if stdout.is_open() => {
                stdout.forward(read, |s| output.push_output(s))?;
            }
            read = stderr.read(), if stderr.is_open() => {
                stderr.forward(read, |s| output.push_error(s))?;
            }
            exited = &mut wait => break exited.map_err(WaitError::Wait)?,
        }

        tokio::task::yield_now().await;
    };

    // Pipes may outlive the child when it left background processes behind.
    stdout.drain(|s| output.push_output(s)).await?;
    stderr.drain(|s| output.push_error(s)).await?;
    Ok(status.code())
}

/// One captured stream plus the bytes of a character split across reads.
struct Pump<R> {
    stream: &'static str,
    reader: Option<R>,
    buf: Vec<u8>,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> Pump<R> {
    fn new(stream: &'static str, reader: Option<R>) -> Self {
        Self {
            stream,
            reader,
            buf: vec![0u8; CHUNK_BYTES],
            pending: Vec::new(),
        }
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    async fn read(&mut self) -> std::io::Result<usize> {
        match self.reader.as_mut() {
            Some(r) => r.read(&mut self.buf).await,
            None => std::future::pending().await,
        }
    }

    fn forward(
        &mut self,
        read: std::io::Result<usize>,
        push: impl Fn(&str),
    ) -> Result<(), WaitError> {
        let n = read.map_err(|source| {
            WaitError::Stream(ProcessError::StreamIo {
                stream: self.stream,
                source,
            })
        })?;
        if n == 0 {
            self.close(push);
            return Ok(());
        }
        self.pending.extend_from_slice(&self.buf[..n]);
        let text = drain_utf8(&mut self.pending);
        if !text.is_empty() {
            push(&text);
        }
        Ok(())
    }

    fn close(&mut self, push: impl Fn(&str)) {
        self.reader = None;
        flush_lossy(&mut self.pending, push);
    }

    /// Forward what is already buffered after the child exited; stop at the
    /// first read that does not complete within [`DRAIN_GRACE`].
    async fn drain(&mut self, push: impl Fn(&str)) -> Result<(), WaitError> {
        while self.is_open() {
            match tokio::time::timeout(DRAIN_GRACE, self.read()).await {
                Ok(read) => self.forward(read, &push)?,
                Err(_) => {
                    tracing::debug!(stream = self.stream, "pipe held open after exit, closing");
                    self.close(&push);
                }
            }
        }
        Ok(())
    }
}

/// Take the longest valid UTF-8 prefix out of `pending`, leaving an
/// incomplete trailing character for the next read. Invalid bytes are
/// replaced.
fn drain_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let text = text.to_string();
            pending.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let rest = pending.split_off(valid);
            let text = String::from_utf8_lossy(pending).into_owned();
            *pending = rest;
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(pending).into_owned();
            pending.clear();
            text
        }
    }
}

fn flush_lossy(pending: &mut Vec<u8>, push: impl FnOnce(&str)) {
    if !pending.is_empty() {
        push(&String::from_utf8_lossy(pending));
        pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_keeps_split_multibyte_tail() {
        let mut pending = "héllo".as_bytes().to_vec();
        let tail = pending.split_off(2); // splits the two-byte 'é'
        let first = drain_utf8(&mut pending);
        assert_eq!(first, "h");
        assert_eq!(pending, vec![0xC3]);

        pending.extend_from_slice(&tail);
        assert_eq!(drain_utf8(&mut pending), "éllo");
        assert!(pending.is_empty());
    }

    #[test]
    fn drain_replaces_invalid_bytes() {
        let mut pending = vec![b'a', 0xFF, b'b'];
        assert_eq!(drain_utf8(&mut pending), "a\u{FFFD}b");
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let out = crate::executor::CollectedOutput::new();
        let err = InActionProcess::new(".", vec![], Duration::from_secs(1))
            .run(&out)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::EmptyCommand));
    }
}
