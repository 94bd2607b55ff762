pub mod auth;
pub mod config;
pub mod run;

use std::path::{Path, PathBuf};

use kommo_export_core::{Config, ConfigError};

/// Load the config from `path` (or the default location) with environment
/// overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env();
            Ok(config)
        }
        None => Config::load(),
    }
}

pub fn config_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::path(),
    }
}
