//! Manager configuration, loaded from `~/.config/dbus-notify/config.json`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::notification::error::NotifyError;
use crate::notification::request::Timeout;

pub const DEFAULT_APP_NAME: &str = "dbus_notification";

/// Diagnostic verbosity of a single manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<Verbosity> for LevelFilter {
    fn from(verbosity: Verbosity) -> Self {
        match verbosity {
            Verbosity::Off => LevelFilter::OFF,
            Verbosity::Error => LevelFilter::ERROR,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Sent as the application name and used as the action namespace
    pub app_name: String,
    pub verbosity: Verbosity,
    /// Reply timeout of calls that wait for the daemon
    pub call_timeout_ms: u64,
    /// Delay before the listener installs its match rules
    pub settle_delay_ms: u64,
    /// How long one listener receive blocks before checking for cancellation
    pub poll_interval_ms: u64,
    /// Expire timeout the command line uses when `--timeout` is not given
    pub default_timeout: Timeout,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            verbosity: Verbosity::default(),
            call_timeout_ms: 1000,
            settle_delay_ms: 500,
            poll_interval_ms: 250,
            default_timeout: Timeout::Default,
        }
    }
}

impl ManagerConfig {
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Default config file location
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dbus-notify")
            .join("config.json")
    }

    /// Loads the default config file, falling back to defaults when it does not exist
    pub fn load() -> Result<Self, NotifyError> {
        let path = Self::path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, NotifyError> {
        let content = fs::read_to_string(path)
            .map_err(|e| NotifyError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| NotifyError::Config(format!("{}: {}", path.display(), e)))
    }
}
