use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::SweepError;

/// Global configuration instance
static CONFIG: OnceCell<SweepConfig> = OnceCell::new();

/// Engine configuration.
///
/// Holds only process-level settings. IMAP credentials are never part of the
/// config file; they arrive per call in [`crate::types::ConnectionParams`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Maximum number of pooled database connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            pool_size: default_pool_size(),
        }
    }
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailsweep")
        .join("mailsweep.db")
}

fn default_pool_size() -> u32 {
    8
}

/// Load configuration from a TOML file, or fall back to defaults when no
/// path is given.
pub fn load(path: Option<&Path>) -> Result<SweepConfig, SweepError> {
    let Some(path) = path else {
        return Ok(SweepConfig::default());
    };

    let raw = fs::read_to_string(path)
        .map_err(|e| SweepError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config: SweepConfig = toml::from_str(&raw)
        .map_err(|e| SweepError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Install the process-wide configuration. First call wins.
pub fn init(config: SweepConfig) -> &'static SweepConfig {
    CONFIG.get_or_init(|| config)
}

/// The installed configuration, if [`init`] has run.
pub fn get() -> Option<&'static SweepConfig> {
    CONFIG.get()
}
