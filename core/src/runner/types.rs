use serde::{Deserialize, Serialize};

/// How a finished subprocess ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub command: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn failure_message(&self) -> String {
        match self.exit_code {
            Some(code) => format!("command `{}` exited with code {}", self.command, code),
            None => format!("command `{}` was terminated by a signal", self.command),
        }
    }
}
