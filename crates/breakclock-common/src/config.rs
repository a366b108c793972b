//! Configuration structures for the break clock.
//!
//! Supports TOML deserialization with defaults tuned for interactive
//! debugging sessions. All tunables are process-wide and must be set
//! before the clock is first used.

use crate::error::{ClockError, ClockResult};
use crate::time::ticks;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level break clock configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Stretch of uninterrupted normal execution after which the break
    /// monitor stops itself.
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,

    /// Largest gap between two monitor samples still considered normal
    /// execution. Anything at or above this is credited as pause time.
    #[serde(with = "humantime_serde")]
    pub loop_check_threshold: Duration,

    /// How debugger attachment is detected.
    pub debugger: DebuggerMode,

    /// Name given to the busy-poll monitor thread.
    pub monitor_thread_name: String,

    /// Auto-start watcher configuration.
    pub auto_start: AutoStartConfig,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(5),
            loop_check_threshold: ticks(2000),
            debugger: DebuggerMode::Auto,
            monitor_thread_name: String::from("break-monitor"),
            auto_start: AutoStartConfig::default(),
        }
    }
}

/// Debugger attachment detection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DebuggerMode {
    /// Ask the host (e.g. `TracerPid` on Linux).
    #[default]
    Auto,
    /// Never report a debugger; the clock degrades to plain wall time.
    Never,
    /// Always report a debugger. Useful for tests and CI.
    Always,
}

/// Auto-start watcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoStartConfig {
    /// Start the watcher when the clock is constructed.
    pub enabled: bool,

    /// Sleep between two drift observations. Tolerance is twice this.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for AutoStartConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl AutoStartConfig {
    /// Drift above which the watcher starts the monitor.
    #[must_use]
    pub fn tolerance(&self) -> Duration {
        self.poll_interval * 2
    }
}

impl ClockConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }

    /// Serialize configuration to TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check the tunables for values the monitor cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Config`] for a zero cooldown, zero threshold,
    /// a threshold not shorter than the cooldown, or a zero poll interval
    /// while auto-start is enabled.
    pub fn validate(&self) -> ClockResult<()> {
        if self.cooldown.is_zero() {
            return Err(ClockError::Config("cooldown must be non-zero".into()));
        }
        if self.loop_check_threshold.is_zero() {
            return Err(ClockError::Config(
                "loop_check_threshold must be non-zero".into(),
            ));
        }
        if self.loop_check_threshold >= self.cooldown {
            return Err(ClockError::Config(format!(
                "loop_check_threshold ({}) must be shorter than cooldown ({})",
                humantime::format_duration(self.loop_check_threshold),
                humantime::format_duration(self.cooldown)
            )));
        }
        if self.auto_start.enabled && self.auto_start.poll_interval.is_zero() {
            return Err(ClockError::Config(
                "auto_start.poll_interval must be non-zero".into(),
            ));
        }
        if self.monitor_thread_name.is_empty() {
            return Err(ClockError::Config(
                "monitor_thread_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O error.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("failed to serialize TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Serde helper module for `Duration` using humantime format.
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}
