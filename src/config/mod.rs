//! TOML configuration with sensible defaults.
//!
//! Lives at `~/.config/tributary/config.toml`; a default file is written on
//! first run so the knobs are discoverable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::{Result, TributaryError};
use crate::sync::DEFAULT_WORKERS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub fetch: FetchConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Interval between sync cycles, e.g. "15m", "1h", "90s".
    pub interval: String,
    /// Entries older than this many days are swept. Zero or negative keeps
    /// everything forever.
    pub delete_after: i64,
    /// Maximum simultaneous outbound fetches per cycle.
    pub workers: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: "15m".to_string(),
            delete_after: 30,
            workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request HTTP timeout, e.g. "10s", "1m".
    pub timeout: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: "10s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database. Defaults to the platform data dir.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load from the given path, or from the default location when `None`.
    /// A missing default file is created with defaults; a missing explicit
    /// path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let path = Self::default_path()?;
                if !path.exists() {
                    let config = Self::default();
                    config.write(&path)?;
                    return Ok(config);
                }
                Self::read(&path)
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| TributaryError::Config(format!("{}: {}", path.display(), e)))?;
        config.interval_duration()?;
        Ok(config)
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| TributaryError::Config(e.to_string()))?;
        fs::write(path, raw)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| TributaryError::Config("no config directory on this platform".into()))?;
        Ok(dir.join("tributary").join("config.toml"))
    }

    /// The sync interval as a duration. Zero is rejected so the scheduler
    /// timer always has a period.
    pub fn interval_duration(&self) -> Result<Duration> {
        let secs = parse_interval(&self.sync.interval)
            .map_err(TributaryError::Config)?;
        if secs == 0 {
            return Err(TributaryError::Config(format!(
                "sync.interval must be positive, got {:?}",
                self.sync.interval
            )));
        }
        Ok(Duration::from_secs(secs))
    }

    /// Per-request HTTP timeout for the fetcher.
    pub fn fetch_timeout(&self) -> Result<Duration> {
        let secs = parse_interval(&self.fetch.timeout).map_err(TributaryError::Config)?;
        if secs == 0 {
            return Err(TributaryError::Config(format!(
                "fetch.timeout must be positive, got {:?}",
                self.fetch.timeout
            )));
        }
        Ok(Duration::from_secs(secs))
    }

    /// Database path from config, falling back to the platform data dir.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        let dir = dirs::data_dir()
            .ok_or_else(|| TributaryError::Config("no data directory on this platform".into()))?;
        Ok(dir.join("tributary").join("tributary.db"))
    }
}

/// Parse an interval string like "1h", "30m", "1d", "45s", or raw seconds.
pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
    let s = s.trim().to_lowercase();

    if let Some(hours) = s.strip_suffix('h') {
        hours
            .parse::<u64>()
            .map(|h| h * 3600)
            .map_err(|_| format!("Invalid hours: {}", hours))
    } else if let Some(minutes) = s.strip_suffix('m') {
        minutes
            .parse::<u64>()
            .map(|m| m * 60)
            .map_err(|_| format!("Invalid minutes: {}", minutes))
    } else if let Some(days) = s.strip_suffix('d') {
        days.parse::<u64>()
            .map(|d| d * 86400)
            .map_err(|_| format!("Invalid days: {}", days))
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>()
            .map_err(|_| format!("Invalid seconds: {}", secs))
    } else {
        s.parse::<u64>()
            .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s))
    }
}
