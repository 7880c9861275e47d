//! Runtime configuration
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. TOML file (explicit path, else ~/.local/share/struk/config.toml if present)
//! 3. Environment variables (`STRUK_WEEK_START`, `STRUK_EXTRACTION_TIMEOUT_SECS`)
//!
//! ```toml
//! [summary]
//! week_start = "monday"
//!
//! [extraction]
//! timeout_secs = 60
//! ```
//!
//! AI backend selection is environment-only; see `ai::AIClient::from_env`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::WeekStart;

/// Environment variable overriding the week start day
pub const WEEK_START_ENV: &str = "STRUK_WEEK_START";

/// Environment variable overriding the model call timeout
pub const EXTRACTION_TIMEOUT_ENV: &str = "STRUK_EXTRACTION_TIMEOUT_SECS";

/// Default timeout for a single model call
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// First day of a week for weekly summaries
    pub week_start: WeekStart,
    /// Upper bound on each call to the image-understanding model
    pub extraction_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            week_start: WeekStart::Monday,
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }
}

impl Config {
    /// Load from file (if any) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml(&content)
    }

    /// Parse TOML content, filling unspecified values with defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        if let Some(summary) = raw.summary {
            if let Some(week_start) = summary.week_start {
                config.week_start = week_start.parse().map_err(Error::Config)?;
            }
        }

        if let Some(extraction) = raw.extraction {
            if let Some(secs) = extraction.timeout_secs {
                config.extraction_timeout = timeout_from_secs(secs)?;
            }
        }

        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(week_start) = lookup(WEEK_START_ENV) {
            self.week_start = week_start.parse().map_err(Error::Config)?;
        }
        if let Some(secs) = lookup(EXTRACTION_TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a number of seconds", EXTRACTION_TIMEOUT_ENV))
            })?;
            self.extraction_timeout = timeout_from_secs(secs)?;
        }
        Ok(())
    }
}

fn timeout_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::Config("Extraction timeout must be positive".into()));
    }
    Ok(Duration::from_secs(secs))
}

/// Default config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("struk").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    summary: Option<RawSummary>,
    extraction: Option<RawExtraction>,
}

#[derive(Debug, Deserialize)]
struct RawSummary {
    week_start: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    timeout_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.week_start, WeekStart::Monday);
        assert_eq!(config.extraction_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            [summary]
            week_start = "sunday"

            [extraction]
            timeout_secs = 15
            "#,
        )
        .unwrap();
        assert_eq!(config.week_start, WeekStart::Sunday);
        assert_eq!(config.extraction_timeout, Duration::from_secs(15));

        // Empty file is all defaults
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_toml("[summary]\nweek_start = \"friday\"").is_err());
        assert!(Config::from_toml("[extraction]\ntimeout_secs = 0").is_err());
        assert!(Config::from_toml("not toml at all [").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let env: HashMap<&str, &str> = [(WEEK_START_ENV, "sunday"), (EXTRACTION_TIMEOUT_ENV, "5")]
            .into_iter()
            .collect();

        let mut config = Config::from_toml("[summary]\nweek_start = \"monday\"").unwrap();
        config
            .apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.week_start, WeekStart::Sunday);
        assert_eq!(config.extraction_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[extraction]\ntimeout_secs = 90\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.extraction_timeout, Duration::from_secs(90));

        assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
    }
}
