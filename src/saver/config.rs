//! Configuration loader and validator
//!
//! Loads saver configuration from a TOML file. Every field is optional; the
//! idle defaults depend on the mode (a short demo timeout for the interactive
//! mode, half an hour for the background service).

use crate::backend::BluetoothSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Interactive mode idle timeout (seconds)
pub const INTERACTIVE_TIMEOUT_SECS: u64 = 30;

/// Service mode idle timeout (seconds)
pub const SERVICE_TIMEOUT_SECS: u64 = 1800;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Deployment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Foreground: prints status, exits on request
    Interactive,

    /// Background: no console, runs until terminated
    #[default]
    Service,
}

/// What happens to the armed flag after a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RearmPolicy {
    /// Stay disarmed until the next input
    #[default]
    UntilInput,

    /// Stay armed; sweep again every threshold while idle continues
    EveryThreshold,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub idle: IdleSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub bluetooth: BluetoothSettings,
}

/// Idle detection settings. `None` means "mode default".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleSettings {
    /// Seconds without input before controllers are disconnected
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Poll interval
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Do not arm until the first input is seen
    #[serde(default)]
    pub require_initial_input: Option<bool>,

    #[serde(default)]
    pub rearm_policy: RearmPolicy,

    /// Print time since last input while armed
    #[serde(default)]
    pub report_idle_time: Option<bool>,
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            tick_interval_ms: default_tick_interval_ms(),
            require_initial_input: None,
            rearm_policy: RearmPolicy::default(),
            report_idle_time: None,
        }
    }
}

fn default_tick_interval_ms() -> u64 { 100 }
fn default_true() -> bool { true }

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Append log output to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            file: None,
        }
    }
}

/// Idle loop settings with mode defaults applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    /// Selects the sweep status wording
    pub mode: Mode,
    pub threshold: Duration,
    pub tick_interval: Duration,
    pub require_initial_input: bool,
    pub rearm_policy: RearmPolicy,
    pub report_idle_time: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Config::for_mode(Mode::Service).loop_settings()
    }
}

impl Config {
    /// Defaults for the given mode
    pub fn for_mode(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("idle.timeout_secs must be positive".into()));
        }

        if self.idle.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("idle.tick_interval_ms must be positive".into()));
        }

        if self.bluetooth.watch_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "bluetooth.watch_interval_secs must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Idle threshold, explicit or mode default
    pub fn threshold(&self) -> Duration {
        let secs = self.idle.timeout_secs.unwrap_or(match self.mode {
            Mode::Interactive => INTERACTIVE_TIMEOUT_SECS,
            Mode::Service => SERVICE_TIMEOUT_SECS,
        });
        Duration::from_secs(secs)
    }

    /// Resolve the loop settings for the configured mode
    pub fn loop_settings(&self) -> LoopSettings {
        let interactive = self.mode == Mode::Interactive;

        LoopSettings {
            mode: self.mode,
            threshold: self.threshold(),
            tick_interval: Duration::from_millis(self.idle.tick_interval_ms),
            require_initial_input: self.idle.require_initial_input.unwrap_or(interactive),
            rearm_policy: self.idle.rearm_policy,
            report_idle_time: self.idle.report_idle_time.unwrap_or(interactive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_defaults() {
        let settings = Config::for_mode(Mode::Service).loop_settings();
        assert_eq!(settings.threshold, Duration::from_secs(1800));
        assert_eq!(settings.tick_interval, Duration::from_millis(100));
        assert!(!settings.require_initial_input);
        assert!(!settings.report_idle_time);
        assert_eq!(settings.rearm_policy, RearmPolicy::UntilInput);
    }

    #[test]
    fn test_interactive_defaults() {
        let settings = Config::for_mode(Mode::Interactive).loop_settings();
        assert_eq!(settings.threshold, Duration::from_secs(30));
        assert!(settings.require_initial_input);
        assert!(settings.report_idle_time);
    }

    #[test]
    fn test_empty_file_is_service_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.mode, Mode::Service);
        assert_eq!(config.loop_settings(), LoopSettings::default());
        assert!(config.logging.enabled);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::parse(
            r#"
            mode = "interactive"

            [idle]
            timeout_secs = 60
            tick_interval_ms = 250
            require_initial_input = false
            rearm_policy = "every_threshold"

            [logging]
            file = "/controllersaver.log"

            [bluetooth]
            match_all_connected = true
            name_prefixes = ["Pro Controller"]
            "#,
        )
        .unwrap();

        let settings = config.loop_settings();
        assert_eq!(config.mode, Mode::Interactive);
        assert_eq!(settings.threshold, Duration::from_secs(60));
        assert_eq!(settings.tick_interval, Duration::from_millis(250));
        assert!(!settings.require_initial_input);
        // Not set: falls back to the interactive default
        assert!(settings.report_idle_time);
        assert_eq!(settings.rearm_policy, RearmPolicy::EveryThreshold);
        assert_eq!(config.logging.file, Some(PathBuf::from("/controllersaver.log")));
        assert!(config.bluetooth.match_all_connected);
        assert_eq!(config.bluetooth.name_prefixes, vec!["Pro Controller".to_string()]);
        assert_eq!(config.bluetooth.watch_interval_secs, 5);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = Config::parse(r#"mode = "applet""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let result = Config::parse("[idle]\ntimeout_secs = 0\n");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let result = Config::parse("[idle]\ntick_interval_ms = 0\n");
        assert!(result.unwrap_err().to_string().contains("tick_interval_ms"));
    }

    #[test]
    fn test_zero_watch_interval_rejected() {
        let result = Config::parse("[bluetooth]\nwatch_interval_secs = 0\n");
        assert!(result.unwrap_err().to_string().contains("watch_interval_secs"));
    }

    #[test]
    fn test_shipped_config_logs_to_stderr() {
        let config = Config::parse(include_str!("../../configs/default.toml")).unwrap();
        assert_eq!(config.mode, Mode::Service);
        assert!(config.logging.enabled);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saver.toml");
        std::fs::write(&path, "[idle]\ntimeout_secs = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.threshold(), Duration::from_secs(5));

        let missing = Config::load(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
