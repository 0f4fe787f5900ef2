//! Configuration loading and management
//!
//! Handles parsing of `checklists.toml` configuration files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checklist::RESET_DAYS_RANGE;
use crate::document::DEFAULT_DUPLICATE_SUFFIX;
use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage;

/// File name of the configuration inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "checklists.toml";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Document location; the platform data directory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// How long a mutation waits for the document lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    #[serde(default)]
    pub checklists: ChecklistsConfig,

    #[serde(default)]
    pub auto_reset: AutoResetConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: None,
            lock_timeout_ms: default_lock_timeout_ms(),
            checklists: ChecklistsConfig::default(),
            auto_reset: AutoResetConfig::default(),
        }
    }
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

/// Checklist lifecycle settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistsConfig {
    /// Appended to the title of a duplicated checklist
    #[serde(default = "default_duplicate_suffix")]
    pub duplicate_suffix: String,
}

fn default_duplicate_suffix() -> String {
    DEFAULT_DUPLICATE_SUFFIX.to_string()
}

impl Default for ChecklistsConfig {
    fn default() -> Self {
        Self {
            duplicate_suffix: default_duplicate_suffix(),
        }
    }
}

/// Auto-reset settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoResetConfig {
    /// Days used when auto-reset is enabled without an explicit count
    #[serde(default = "default_reset_after_days")]
    pub default_reset_after_days: u32,

    /// Period of the `watch` sweep, e.g. "45s", "30m", "1h", "7d"
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: String,
}

fn default_reset_after_days() -> u32 {
    7
}

fn default_sweep_interval() -> String {
    "1h".to_string()
}

impl Default for AutoResetConfig {
    fn default() -> Self {
        Self {
            default_reset_after_days: default_reset_after_days(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

/// Parse a duration string like "45s", "30m", "2h", "7d"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::InvalidArgument("Duration cannot be empty".to_string()));
    }

    let (num_str, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, "s"),
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| Error::InvalidArgument(format!("Invalid duration number: {num_str}")))?;

    let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
        "s" | "sec" | "second" | "seconds" => 1,
        "m" | "min" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86_400,
        _ => {
            return Err(Error::InvalidArgument(format!(
                "Invalid duration unit '{unit}'. Expected: s, m, h, d"
            )));
        }
    };

    let seconds = num
        .checked_mul(seconds_per_unit)
        .ok_or_else(|| Error::InvalidArgument(format!("Duration too large: {s}")))?;
    if seconds == 0 {
        return Err(Error::InvalidArgument("Duration must be positive".to_string()));
    }
    Ok(Duration::from_secs(seconds))
}

impl Config {
    /// `<platform config dir>/checklists.toml`
    pub fn default_path() -> Option<PathBuf> {
        storage::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load configuration from a `checklists.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, or return defaults.
    ///
    /// An unreadable or invalid file is logged and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
            Self::default()
        })
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Document path: the explicit override, then `data_file`, then the
    /// platform default.
    pub fn data_file(&self, override_path: Option<&Path>) -> PathBuf {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.data_file.clone())
            .unwrap_or_else(storage::default_data_file)
    }

    pub fn sweep_interval(&self) -> Result<Duration> {
        parse_duration(&self.auto_reset.sweep_interval)
    }

    fn validate(&self) -> Result<()> {
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.checklists.duplicate_suffix.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "checklists.duplicate_suffix cannot be empty".to_string(),
            ));
        }
        if !RESET_DAYS_RANGE.contains(&self.auto_reset.default_reset_after_days) {
            return Err(Error::InvalidConfig(format!(
                "auto_reset.default_reset_after_days must be between {} and {}",
                RESET_DAYS_RANGE.start(),
                RESET_DAYS_RANGE.end()
            )));
        }
        self.sweep_interval().map_err(|err| {
            Error::InvalidConfig(format!("auto_reset.sweep_interval: {err}"))
        })?;
        Ok(())
    }
}
