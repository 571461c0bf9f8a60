//! CLI configuration, parsed from an optional TOML file plus environment
//! variable overrides.
//!
//! Priority: command line flags > environment variables > config file > defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for keys printed per service/user pair
pub const MAX_KEY_COUNT: usize = 100;

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub derivation: DerivationSection,

    #[serde(default)]
    pub display: DisplaySection,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DerivationSection {
    /// Keys printed per service/user pair (default: 5)
    #[serde(default = "default_key_count")]
    pub key_count: usize,
}

impl Default for DerivationSection {
    fn default() -> Self {
        Self {
            key_count: default_key_count(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySection {
    /// Print the skeleton key fingerprint after confirmation
    #[serde(default)]
    pub show_fingerprint: bool,

    /// Warn when the skeleton key looks guessable
    #[serde(default)]
    pub warn_weak_key: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level (off, error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_key_count() -> usize {
    5
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse TOML config")
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `SKELE_KEY_COUNT`
    /// - `SKELE_SHOW_FINGERPRINT`
    /// - `SKELE_WARN_WEAK_KEY`
    /// - `SKELE_LOG_LEVEL`
    ///
    /// Values that do not parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(n) = var("SKELE_KEY_COUNT").and_then(|v| v.parse().ok()) {
            self.derivation.key_count = n;
        }
        if let Some(b) = var("SKELE_SHOW_FINGERPRINT").and_then(|v| parse_bool(&v)) {
            self.display.show_fingerprint = b;
        }
        if let Some(b) = var("SKELE_WARN_WEAK_KEY").and_then(|v| parse_bool(&v)) {
            self.display.warn_weak_key = b;
        }
        if let Some(level) = var("SKELE_LOG_LEVEL") {
            self.logging.log_level = level;
        }
    }

    /// Validate that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (1..=MAX_KEY_COUNT).contains(&self.derivation.key_count),
            "derivation.key_count must be between 1 and {}",
            MAX_KEY_COUNT
        );
        anyhow::ensure!(
            LOG_LEVELS.contains(&self.logging.log_level.to_ascii_lowercase().as_str()),
            "logging.log_level must be one of {}",
            LOG_LEVELS.join(", ")
        );
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
