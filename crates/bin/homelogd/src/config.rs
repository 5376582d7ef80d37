//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `homelog.toml` in the working directory (or the file named by
//! `HOMELOG_CONFIG`). Every field has a default so the file is optional.
//! Environment variables take precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use homelog_adapter_pushover::{DEFAULT_API_URL, PushoverConfig};
use homelog_adapter_virtual::VirtualNetworkConfig;
use homelog_app::ingest::DEFAULT_CAPACITY;
use homelog_app::services::motion_light::MotionLightConfig;
use homelog_app::services::threshold_alerts::ThresholdRule;
use homelog_app::worker::WorkerConfig;
use homelog_domain::id::ValueId;

const DEFAULT_PATH: &str = "homelog.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub queue: QueueConfig,
    pub worker: WorkerSettings,
    pub logging: LoggingConfig,
    pub pushover: PushoverSettings,
    pub light: LightConfig,
    /// Threshold alert rules, `[[alerts]]` tables.
    pub alerts: Vec<AlertConfig>,
    #[serde(rename = "virtual")]
    pub virtual_network: VirtualSettings,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite:` URL or file path.
    pub url: String,
}

/// Ingest queue sizing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Readings buffered before producers block.
    pub capacity: usize,
}

/// Persistence worker timing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub poll_timeout_ms: u64,
    pub commit_interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Pushover notifications.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PushoverSettings {
    pub enabled: bool,
    pub token: Option<String>,
    pub user_keys: Vec<String>,
    pub api_url: String,
}

/// Light following motion reports.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub value_id: Option<ValueId>,
    pub follow_motion: bool,
}

/// One threshold alert rule.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    pub value_id: ValueId,
    #[serde(default)]
    pub above: Option<f64>,
    #[serde(default)]
    pub below: Option<f64>,
    pub message: String,
}

/// Simulated device network.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VirtualSettings {
    pub enabled: bool,
    pub interval_ms: u64,
}

impl Config {
    /// Load configuration from `homelog.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("HOMELOG_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("HOMELOG_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("HOMELOG_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("HOMELOG_PUSHOVER_TOKEN") {
            self.pushover.token = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.queue.capacity == 0 {
            return invalid("queue capacity must be non-zero");
        }
        if self.worker.poll_timeout_ms == 0 {
            return invalid("worker poll timeout must be non-zero");
        }
        if self.worker.commit_interval() < self.worker.poll_timeout() {
            return invalid("worker commit interval must not be shorter than the poll timeout");
        }
        if self.pushover.enabled {
            if self.pushover.token.as_deref().is_none_or(|t| t.trim().is_empty()) {
                return invalid("pushover is enabled but no token is set");
            }
            if self.pushover.user_keys.is_empty() {
                return invalid("pushover is enabled but no user key is set");
            }
        }
        if self.virtual_network.enabled && self.virtual_network.interval_ms == 0 {
            return invalid("virtual network interval must be non-zero");
        }
        if let Some(rule) = self
            .alerts
            .iter()
            .find(|rule| rule.above.is_none() && rule.below.is_none())
        {
            return Err(ConfigError::Validation(format!(
                "alert for value {} has neither `above` nor `below`",
                rule.value_id
            )));
        }
        Ok(())
    }

    /// Worker timing as used by the persistence worker.
    #[must_use]
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            poll_timeout: self.worker.poll_timeout(),
            commit_interval: self.worker.commit_interval(),
        }
    }

    /// Pushover client settings, `None` when notifications are disabled.
    #[must_use]
    pub fn pushover_config(&self) -> Option<PushoverConfig> {
        if !self.pushover.enabled {
            return None;
        }
        let token = self.pushover.token.clone()?;
        Some(PushoverConfig {
            api_url: self.pushover.api_url.clone(),
            ..PushoverConfig::new(token, self.pushover.user_keys.clone())
        })
    }

    #[must_use]
    pub fn motion_light_config(&self) -> MotionLightConfig {
        MotionLightConfig {
            light: self.light.value_id,
            follow_motion: self.light.follow_motion,
        }
    }

    #[must_use]
    pub fn threshold_rules(&self) -> Vec<ThresholdRule> {
        self.alerts
            .iter()
            .map(|alert| ThresholdRule {
                value_id: alert.value_id,
                above: alert.above,
                below: alert.below,
                message: alert.message.clone(),
            })
            .collect()
    }

    /// Virtual network settings, `None` when disabled.
    #[must_use]
    pub fn virtual_network_config(&self) -> Option<VirtualNetworkConfig> {
        self.virtual_network.enabled.then(|| VirtualNetworkConfig {
            interval: Duration::from_millis(self.virtual_network.interval_ms),
        })
    }
}

impl WorkerSettings {
    fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    fn commit_interval(&self) -> Duration {
        Duration::from_secs(self.commit_interval_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "home.db".to_string(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_timeout_ms: 1_000,
            commit_interval_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,sqlx=warn".to_string(),
        }
    }
}

impl Default for PushoverSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            token: None,
            user_keys: Vec::new(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl Default for VirtualSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 1_000,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "home.db");
        assert_eq!(config.queue.capacity, 10_000);
        assert_eq!(
            config.worker_config(),
            WorkerConfig {
                poll_timeout: Duration::from_secs(1),
                commit_interval: Duration::from_secs(30),
            }
        );
        assert!(!config.pushover.enabled);
        assert!(config.pushover_config().is_none());
        assert!(!config.light.follow_motion);
        assert!(config.alerts.is_empty());
        assert!(config.virtual_network_config().is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.queue.capacity, 10_000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [database]
            url = 'sqlite:test.db'

            [queue]
            capacity = 64

            [worker]
            poll_timeout_ms = 250
            commit_interval_secs = 5

            [logging]
            filter = 'debug'

            [pushover]
            enabled = true
            token = 'app-token'
            user_keys = ['alice', 'bob']
            api_url = 'http://localhost:9999'

            [light]
            value_id = 0x100000002494000
            follow_motion = true

            [[alerts]]
            value_id = 72057594081706034
            above = 30
            message = 'Too hot'

            [[alerts]]
            value_id = 0x2a
            below = 5.5
            message = 'Too cold'

            [virtual]
            enabled = false
            interval_ms = 10
        ";
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.queue.capacity, 64);
        assert_eq!(
            config.worker_config().poll_timeout,
            Duration::from_millis(250)
        );
        assert_eq!(config.logging.filter, "debug");
        let pushover = config.pushover_config().unwrap();
        assert_eq!(pushover.token, "app-token");
        assert_eq!(pushover.user_keys, ["alice", "bob"]);
        assert_eq!(pushover.api_url, "http://localhost:9999");
        assert_eq!(
            config.motion_light_config(),
            MotionLightConfig {
                light: Some(ValueId::new(0x0100_0000_0249_4000)),
                follow_motion: true,
            }
        );
        let rules = config.threshold_rules();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].above, Some(30.0));
        assert_eq!(rules[1].value_id, ValueId::new(42));
        assert_eq!(rules[1].below, Some(5.5));
        assert!(config.virtual_network_config().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.database.url, "home.db");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("homelog.toml");
        std::fs::write(&path, "invalid {{{").unwrap();

        let result = Config::from_file(path.to_str().unwrap());

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn should_prefer_environment_over_file() {
        let vars = HashMap::from([
            ("HOMELOG_DATABASE_URL", "sqlite::memory:"),
            ("HOMELOG_LOG", "debug"),
            ("RUST_LOG", "trace"),
            ("HOMELOG_PUSHOVER_TOKEN", "secret"),
        ]);
        let mut config = Config::default();

        config.apply_overrides(|name| vars.get(name).map(ToString::to_string));

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.logging.filter, "trace");
        assert_eq!(config.pushover.token.as_deref(), Some("secret"));
    }

    #[test]
    fn should_keep_file_values_without_environment() {
        let mut config = Config::default();
        config.apply_overrides(|_| None);
        assert_eq!(config.database.url, "home.db");
    }

    #[test]
    fn should_reject_zero_capacity() {
        let mut config = Config::default();
        config.queue.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_poll_timeout() {
        let mut config = Config::default();
        config.worker.poll_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_commit_interval_shorter_than_poll_timeout() {
        let mut config = Config::default();
        config.worker.poll_timeout_ms = 5_000;
        config.worker.commit_interval_secs = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_enabled_pushover_without_credentials() {
        let mut config = Config::default();
        config.pushover.enabled = true;
        config.pushover.user_keys = vec!["alice".to_string()];
        assert!(config.validate().is_err());

        config.pushover.token = Some("app-token".to_string());
        assert!(config.validate().is_ok());

        config.pushover.user_keys.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_alert_without_bounds() {
        let mut config = Config::default();
        config.alerts.push(AlertConfig {
            value_id: ValueId::new(5),
            above: None,
            below: None,
            message: "never".to_string(),
        });
        assert!(config.validate().is_err());
    }
}
