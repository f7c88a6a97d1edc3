//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/storepulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/storepulse/` (~/.config/storepulse/)
//! - Data: `$XDG_DATA_HOME/storepulse/` (~/.local/share/storepulse/)
//! - State/Logs: `$XDG_STATE_HOME/storepulse/` (~/.local/state/storepulse/)

use crate::error::{Error, Result};
use crate::format::Currency;
use serde::Deserialize;
use std::path::{Path, PathBuf};

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
    /// Dashboard and widget configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Database location override
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dashboard configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// ISO 4217 code used for every money-valued widget
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Number of daily buckets in the revenue chart
    #[serde(default = "default_series_lookback")]
    pub series_lookback: u32,

    /// Products with stock at or below this level count as low stock
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,

    /// Widget keys to leave out of the dashboard
    #[serde(default)]
    pub disabled_widgets: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            series_lookback: default_series_lookback(),
            low_stock_threshold: default_low_stock_threshold(),
            disabled_widgets: vec![],
        }
    }
}

impl DashboardConfig {
    /// Resolve the configured currency code.
    pub fn currency(&self) -> Result<Currency> {
        Currency::from_code(&self.currency).ok_or_else(|| {
            Error::Config(format!("dashboard.currency '{}' is not supported", self.currency))
        })
    }

    /// Check whether a widget has been disabled by key.
    pub fn is_disabled(&self, key: &str) -> bool {
        self.disabled_widgets.iter().any(|w| w == key)
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        self.currency()?;
        if self.series_lookback == 0 || self.series_lookback > 366 {
            return Err(Error::Config(
                "dashboard.series_lookback must be between 1 and 366".to_string(),
            ));
        }
        if self.low_stock_threshold < 0 {
            return Err(Error::Config(
                "dashboard.low_stock_threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_series_lookback() -> u32 {
    30
}

fn default_low_stock_threshold() -> i64 {
    5
}

/// Database configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct DatabaseConfig {
    /// Override for the SQLite file location
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
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
    "info".to_string()
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

        config.dashboard.validate()?;
        Ok(config)
    }

    /// Returns the database path, honoring the `[database] path` override.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(Self::default_database_path)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/storepulse/config.toml` (~/.config/storepulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("storepulse").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/storepulse/` (~/.local/share/storepulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("storepulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/storepulse/` (~/.local/state/storepulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("storepulse")
    }

    /// Returns the default database file path
    ///
    /// `$XDG_DATA_HOME/storepulse/data.db` (~/.local/share/storepulse/data.db)
    pub fn default_database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file path
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("storepulse.log")
    }
}
