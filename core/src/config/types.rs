use serde::{Deserialize, Serialize};

use crate::definition::DEFAULT_DEFINITION_FILE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory`.
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "monobuild_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Directory for log files. Filled in by `load_default` when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum targets running at once; logical core count when unset.
    #[serde(default)]
    pub max_parallelism: Option<usize>,

    /// Subprocess timeout for actions that do not set one.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Force CI rendering even on a terminal.
    #[serde(default)]
    pub ci: bool,

    /// Name of the per-directory build definition file.
    #[serde(default = "default_definition_file")]
    pub definition_file: String,
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_definition_file() -> String {
    DEFAULT_DEFINITION_FILE.to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_parallelism: None,
            default_timeout_secs: default_timeout_secs(),
            ci: false,
            definition_file: default_definition_file(),
        }
    }
}
