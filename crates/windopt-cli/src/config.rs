//! Settings file management.
//! Settings live in ~/.windopt/config/windopt.toml (or under $WINDOPT_HOME).

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::common::OutputFormat;

/// Environment variable overriding the ~/.windopt home directory.
pub const HOME_ENV: &str = "WINDOPT_HOME";

/// Main windopt settings structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WindoptSettings {
    /// Data library locations
    #[serde(default)]
    pub library: LibraryConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Report output
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LibraryConfig {
    /// Primary library root, used when neither --library nor WINDOPT_LIBRARY is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Searched when an item is missing from the primary library
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

impl WindoptSettings {
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow!("invalid log level '{}' in settings", self.logging.level))
    }
}

/// The windopt home directory ($WINDOPT_HOME, else ~/.windopt)
pub fn windopt_home() -> Result<PathBuf> {
    if let Some(home) = env::var_os(HOME_ENV).filter(|home| !home.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
        .map(|h| h.join(".windopt"))
}

/// Location: <home>/config/windopt.toml
pub fn settings_path() -> Result<PathBuf> {
    Ok(windopt_home()?.join("config").join("windopt.toml"))
}

/// Load the settings file; a missing file yields the defaults.
pub fn load_settings() -> Result<WindoptSettings> {
    let path = settings_path()?;
    if !path.exists() {
        return Ok(WindoptSettings::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("reading settings file '{}'", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing settings file '{}'", path.display()))
}

pub fn save_settings(settings: &WindoptSettings) -> Result<PathBuf> {
    let path = settings_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let contents = toml::to_string_pretty(settings)?;
    fs::write(&path, contents)?;
    Ok(path)
}

/// Write the default settings unless a file exists (or `force` is set).
///
/// Returns the path and whether it was written.
pub fn ensure_settings(force: bool) -> Result<(PathBuf, bool)> {
    let path = settings_path()?;
    if path.exists() && !force {
        return Ok((path, false));
    }
    let path = save_settings(&WindoptSettings::default())?;
    Ok((path, true))
}
