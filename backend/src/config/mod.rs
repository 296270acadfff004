//! Central module for application-wide configuration settings.
//!
//! This module handles loading and validating the reconciler's retry bounds
//! and timer windows, plus the log filter used by the replay binary. Every
//! field has a default, so an empty or missing file is a valid configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_filter: String,
    pub reconciler: ReconcilerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl Config {
    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.reconciler.validate()?;
        Ok(config)
    }
}

/// Retry bounds and timer windows, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub profile_max_attempts: u32,
    pub profile_base_delay_ms: u64,
    /// Wait after `signed_in` for the canonical `initial_session`.
    pub optimistic_fallback_ms: u64,
    /// Wait after start for any event to resolve the state.
    pub mount_fallback_ms: u64,
    pub status_check_timeout_ms: u64,
    /// Poll interval for a fired timer waiting on an in-flight event.
    pub busy_poll_ms: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            profile_max_attempts: 3,
            profile_base_delay_ms: 500,
            optimistic_fallback_ms: 1_500,
            mount_fallback_ms: 2_000,
            status_check_timeout_ms: 5_000,
            busy_poll_ms: 50,
        }
    }
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.profile_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "profile_max_attempts must be at least 1".into(),
            ));
        }
        let windows = [
            ("optimistic_fallback_ms", self.optimistic_fallback_ms),
            ("mount_fallback_ms", self.mount_fallback_ms),
            ("status_check_timeout_ms", self.status_check_timeout_ms),
            ("busy_poll_ms", self.busy_poll_ms),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    pub fn profile_base_delay(&self) -> Duration {
        Duration::from_millis(self.profile_base_delay_ms)
    }

    pub fn optimistic_fallback(&self) -> Duration {
        Duration::from_millis(self.optimistic_fallback_ms)
    }

    pub fn mount_fallback(&self) -> Duration {
        Duration::from_millis(self.mount_fallback_ms)
    }

    pub fn status_check_timeout(&self) -> Duration {
        Duration::from_millis(self.status_check_timeout_ms)
    }

    pub fn busy_poll(&self) -> Duration {
        Duration::from_millis(self.busy_poll_ms)
    }
}
