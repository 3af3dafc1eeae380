use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options for one build run.
#[derive(Debug, Clone)]
pub struct ExecutionOpts {
    /// Maximum number of targets running at once (clamped to at least 1)
    pub max_parallelism: usize,

    /// Timeout applied to subprocesses that do not set their own
    pub default_timeout: Duration,

    /// Running under CI (affects rendering and is exposed to actions)
    pub ci: bool,

    /// Explicit build id; a random one is generated when unset
    pub build_id: Option<String>,
}

impl Default for ExecutionOpts {
    fn default() -> Self {
        Self {
            max_parallelism: num_cpus::get(),
            default_timeout: Duration::from_secs(3600),
            ci: false,
            build_id: None,
        }
    }
}

impl ExecutionOpts {
    pub fn from_config(cfg: &crate::config::ExecutorConfig) -> Self {
        Self {
            max_parallelism: cfg.max_parallelism.unwrap_or_else(num_cpus::get).max(1),
            default_timeout: Duration::from_secs(cfg.default_timeout_secs),
            ci: cfg.ci,
            build_id: None,
        }
    }
}

/// Facts about the running build, visible to every action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFacts {
    pub build_id: String,
    pub ci: bool,
    pub logical_cores: usize,
    pub max_parallelism: usize,
}

impl BuildFacts {
    pub fn from_opts(opts: &ExecutionOpts) -> Self {
        Self {
            build_id: opts
                .build_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string()),
            ci: opts.ci,
            logical_cores: num_cpus::get(),
            max_parallelism: opts.max_parallelism.max(1),
        }
    }
}

impl Default for BuildFacts {
    fn default() -> Self {
        Self::from_opts(&ExecutionOpts::default())
    }
}
