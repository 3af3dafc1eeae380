use crate::executor::types::{BuildResult, TargetId};

/// Scheduling notifications; one-way, never part of control flow.
#[derive(Debug, Clone)]
pub enum ExecutionEvent<'a> {
    Started {
        id: &'a TargetId,
    },
    Skipped {
        id: &'a TargetId,
        result: &'a BuildResult,
    },
    Finished {
        id: &'a TargetId,
        result: &'a BuildResult,
        stdout: &'a str,
        stderr: &'a str,
    },
}

pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent<'_>);
}
