//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/diarypay/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/diarypay/` (~/.config/diarypay/)
//! - Data: `$XDG_DATA_HOME/diarypay/` (~/.local/share/diarypay/)
//! - State/Logs: `$XDG_STATE_HOME/diarypay/` (~/.local/state/diarypay/)

use crate::db::STORE_FILE_NAME;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "diarypay";

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Where records and attachments live
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// User preferences read by the host application
    #[serde(default)]
    pub preferences: Preferences,
}

/// Storage locations
#[derive(Debug, Deserialize, Default, Clone)]
pub struct StorageConfig {
    /// Override for the directory holding the record store
    pub data_dir: Option<PathBuf>,

    /// Override for the attachment directory
    pub attachments_dir: Option<PathBuf>,

    /// Keep records in memory only (nothing survives a restart)
    #[serde(default)]
    pub in_memory: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Settings the host application exposes to the user.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Preferences {
    /// Monthly spending budget in whole currency units
    pub monthly_budget: Option<i64>,

    #[serde(default)]
    pub app_lock_enabled: bool,

    #[serde(default)]
    pub dark_mode_enabled: bool,
}

impl Preferences {
    /// The budget to measure spending against, if one is set.
    ///
    /// Zero counts as unset.
    pub fn budget(&self) -> Option<i64> {
        self.monthly_budget.filter(|b| *b > 0)
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if let Some(budget) = self.preferences.monthly_budget {
            if budget < 0 {
                return Err(Error::Config(format!(
                    "preferences.monthly_budget must not be negative (got {})",
                    budget
                )));
            }
        }
        Ok(())
    }

    /// Directory holding the record store, honoring `[storage] data_dir`
    pub fn storage_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(Self::data_dir)
    }

    /// Attachment directory, honoring `[storage] attachments_dir`
    pub fn attachment_dir(&self) -> PathBuf {
        self.storage
            .attachments_dir
            .clone()
            .unwrap_or_else(|| self.storage_dir().join("attachments"))
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/diarypay/config.toml` (~/.config/diarypay/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join(APP_DIR).join("config.toml")
    }

    /// Returns the data directory path (for the record store)
    ///
    /// `$XDG_DATA_HOME/diarypay/` (~/.local/share/diarypay/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join(APP_DIR)
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/diarypay/` (~/.local/state/diarypay/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join(APP_DIR)
    }

    /// Returns the default record store path
    pub fn database_path() -> PathBuf {
        Self::data_dir().join(STORE_FILE_NAME)
    }

    /// Returns the default attachment directory
    pub fn attachments_dir() -> PathBuf {
        Self::data_dir().join("attachments")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/diarypay/diarypay.log` (~/.local/state/diarypay/diarypay.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("diarypay.log")
    }
}
