//! CLI-specific configuration layer.
//!
//! Wraps `zwlock_config` with the `--config`, `--host`, `--storage-dir` and
//! `--insecure` overrides from `GlobalOpts`.

use std::path::PathBuf;

use zwlock_config::Config;
use zwlock_core::PlatformConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config` or the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(zwlock_config::config_path)
}

/// Load the config file and apply CLI flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = zwlock_config::load_config_from(&config_path(global))?;
    if let Some(ref host) = global.host {
        cfg.host.clone_from(host);
    }
    if let Some(ref dir) = global.storage_dir {
        cfg.storage_dir = Some(dir.clone());
    }
    if global.insecure {
        cfg.insecure = true;
    }
    Ok(cfg)
}

/// Build the engine config for commands that talk to the gateway.
pub fn platform_config(global: &GlobalOpts) -> Result<PlatformConfig, CliError> {
    let cfg = load(global)?;
    let path = config_path(global);
    if cfg.host.is_empty() && !path.exists() {
        return Err(CliError::NoConfig {
            path: path.display().to_string(),
        });
    }
    Ok(cfg.to_platform_config()?)
}

/// Storage directory with overrides applied; needs no credentials.
pub fn storage_dir(global: &GlobalOpts) -> Result<PathBuf, CliError> {
    Ok(load(global)?.storage_dir())
}
