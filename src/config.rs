//! Runtime configuration.
//!
//! Values come from an optional TOML file, then the environment, then CLI flags
//! (applied by the binary), each layer overriding the previous one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::storage::default_db_path;

/// User id used when none is configured.
pub const DEFAULT_USER: &str = "local";

/// Default `tracing` filter; keeps CLI output free of log lines.
pub const DEFAULT_LOG_FILTER: &str = "practask=warn";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Location of the JSON database.
    pub db_path: PathBuf,
    /// Identity of the learner all commands act on behalf of.
    pub user_id: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: default_db_path(),
            user_id: DEFAULT_USER.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str, path: &Path) -> Result<Config, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Config::from_toml_str(&content, path)
    }

    /// Returns the default config file path: `~/.config/practask/config.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("practask").join("config.toml"))
    }

    /// Loads `explicit` if given, else the default config file when it exists,
    /// then applies `PRACTASK_DB` and `PRACTASK_USER`.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match explicit {
            Some(path) => Config::from_file(path)?,
            None => match Config::default_config_path() {
                Some(path) if path.exists() => Config::from_file(&path)?,
                _ => Config::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(db) = std::env::var("PRACTASK_DB") {
            self.db_path = PathBuf::from(db);
        }
        if let Ok(user) = std::env::var("PRACTASK_USER") {
            if !user.trim().is_empty() {
                self.user_id = user.trim().to_string();
            }
        }
    }
}
