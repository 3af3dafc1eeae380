use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

pub const ENV_MAX_PARALLELISM: &str = "MONOBUILD_MAX_PARALLELISM";
pub const ENV_LOG_LEVEL: &str = "MONOBUILD_LOG_LEVEL";
pub const ENV_DEFINITION_FILE: &str = "MONOBUILD_DEFINITION_FILE";

/// Get the default monobuild data directory: ~/.monobuild
pub fn get_monobuild_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".monobuild"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.monobuild/config.toml
    let data_dir = get_monobuild_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./monobuild.toml
    let local_config = Path::new("monobuild.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_ref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str::<AppConfig>(&s)
        .with_context(|| format!("parsing config file {}", path.display()))
}

/// Environment variable overrides (highest priority). Blank values are ignored.
pub fn apply_env_overrides(
    cfg: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var(ENV_MAX_PARALLELISM) {
        let n: usize = v.trim().parse().with_context(|| {
            format!("{ENV_MAX_PARALLELISM} must be a positive integer, got '{v}'")
        })?;
        if n == 0 {
            anyhow::bail!("{ENV_MAX_PARALLELISM} must be at least 1");
        }
        cfg.executor.max_parallelism = Some(n);
    }
    if let Some(v) = var(ENV_LOG_LEVEL) {
        cfg.logging.level = v;
    }
    if let Some(v) = var(ENV_DEFINITION_FILE) {
        cfg.executor.definition_file = v;
    }

    Ok(())
}
