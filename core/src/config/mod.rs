mod load;
mod types;

pub use load::{
    apply_env_overrides, get_monobuild_data_dir, load_default, load_from_path,
    ENV_DEFINITION_FILE, ENV_LOG_LEVEL, ENV_MAX_PARALLELISM,
};
pub use types::{AppConfig, ExecutorConfig, LoggingConfig};
