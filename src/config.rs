//! Configuration for click assist.
//!
//! Values are corrected on write rather than rejected: out-of-range numbers
//! are clamped and a min/max crossover drags the other bound along, so a
//! range can never be empty or inverted. Settings may be read from a JSON
//! file but are never written back.

use crate::collector::types::MouseButton;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Lowest target CPS accepted.
pub const MIN_TARGET_CPS: f64 = 1.0;
/// Highest target CPS accepted.
pub const MAX_TARGET_CPS: f64 = 50.0;

/// Threshold bounds (user CPS needed before assisting).
pub const MIN_THRESHOLD_CPS: f64 = 1.0;
pub const MAX_THRESHOLD_CPS: f64 = 20.0;

/// Idle timeout bounds.
pub const MIN_IDLE_TIMEOUT: Duration = Duration::from_millis(100);
pub const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bounds for the scheduler and display intervals.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_millis(20);
pub const MAX_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Zero falls back to the default; anything else is capped at `max`.
fn clamp_interval(value: Duration, default: Duration, max: Duration) -> Duration {
    if value.is_zero() {
        default
    } else {
        value.min(max)
    }
}

/// Suggested idle timeout as a multiple of the threshold click interval.
const SUGGESTED_TIMEOUT_FACTOR: f64 = 1.8;

fn clamp_cps(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_TARGET_CPS;
    }
    value.clamp(MIN_TARGET_CPS, MAX_TARGET_CPS)
}

/// Per-button target range and enable switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AssistConfigFile")]
pub struct AssistConfig {
    min_cps: f64,
    max_cps: f64,
    enabled: bool,
}

impl AssistConfig {
    /// Build a config, correcting the range the same way the setters do.
    pub fn new(min_cps: f64, max_cps: f64, enabled: bool) -> Self {
        let mut config = Self {
            min_cps: clamp_cps(min_cps),
            max_cps: clamp_cps(min_cps),
            enabled,
        };
        config.set_max_cps(max_cps);
        config
    }

    /// Defaults per button.
    pub fn default_for(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Self::new(22.0, 23.0, true),
            MouseButton::Right => Self::new(23.0, 24.0, true),
        }
    }

    pub fn min_cps(&self) -> f64 {
        self.min_cps
    }

    pub fn max_cps(&self) -> f64 {
        self.max_cps
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Set the lower bound; raises the upper bound if it would be crossed.
    pub fn set_min_cps(&mut self, value: f64) {
        let value = clamp_cps(value);
        self.min_cps = value;
        if self.max_cps < value {
            self.max_cps = value;
        }
    }

    /// Set the upper bound; lowers the lower bound if it would be crossed.
    pub fn set_max_cps(&mut self, value: f64) {
        let value = clamp_cps(value);
        self.max_cps = value;
        if self.min_cps > value {
            self.min_cps = value;
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// On-disk shape of [`AssistConfig`]; routed through the setters.
#[derive(Debug, Deserialize)]
struct AssistConfigFile {
    min_cps: f64,
    max_cps: f64,
    #[serde(default = "default_true")]
    enabled: bool,
}

impl From<AssistConfigFile> for AssistConfig {
    fn from(file: AssistConfigFile) -> Self {
        Self::new(file.min_cps, file.max_cps, file.enabled)
    }
}

fn default_true() -> bool {
    true
}

/// Settings shared by both buttons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GlobalAssistFile")]
pub struct GlobalAssistState {
    active: bool,
    threshold_cps: f64,
    #[serde(with = "duration_secs")]
    idle_timeout: Duration,
}

impl GlobalAssistState {
    pub fn new(active: bool, threshold_cps: f64, idle_timeout: Duration) -> Self {
        let mut state = Self {
            active,
            threshold_cps: MIN_THRESHOLD_CPS,
            idle_timeout: MIN_IDLE_TIMEOUT,
        };
        state.set_threshold_cps(threshold_cps);
        state.set_idle_timeout(idle_timeout);
        state
    }

    /// Master switch.
    pub fn active(&self) -> bool {
        self.active
    }

    pub fn threshold_cps(&self) -> f64 {
        self.threshold_cps
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn set_threshold_cps(&mut self, value: f64) {
        self.threshold_cps = if value.is_nan() {
            MIN_THRESHOLD_CPS
        } else {
            value.clamp(MIN_THRESHOLD_CPS, MAX_THRESHOLD_CPS)
        };
    }

    pub fn set_idle_timeout(&mut self, value: Duration) {
        self.idle_timeout = value.clamp(MIN_IDLE_TIMEOUT, MAX_IDLE_TIMEOUT);
    }

    /// Convenience for fractional-second inputs (CLI, files).
    pub fn set_idle_timeout_secs(&mut self, secs: f64) {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.set_idle_timeout(Duration::from_secs_f64(secs.min(MAX_IDLE_TIMEOUT.as_secs_f64())));
    }
}

impl Default for GlobalAssistState {
    fn default() -> Self {
        Self::new(true, 3.0, Duration::from_millis(200))
    }
}

#[derive(Debug, Deserialize)]
struct GlobalAssistFile {
    #[serde(default = "default_true")]
    active: bool,
    threshold_cps: f64,
    #[serde(with = "duration_secs")]
    idle_timeout: Duration,
}

impl From<GlobalAssistFile> for GlobalAssistState {
    fn from(file: GlobalAssistFile) -> Self {
        Self::new(file.active, file.threshold_cps, file.idle_timeout)
    }
}

/// Complete configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub global: GlobalAssistState,
    pub left: AssistConfig,
    pub right: AssistConfig,
    /// Scheduler polling interval
    #[serde(with = "duration_secs")]
    pub tick_interval: Duration,
    /// Display refresh interval
    #[serde(with = "duration_secs")]
    pub refresh_interval: Duration,
    /// Back and Forward flip the left and right assist switches
    pub side_button_toggle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: GlobalAssistState::default(),
            left: AssistConfig::default_for(MouseButton::Left),
            right: AssistConfig::default_for(MouseButton::Right),
            tick_interval: Duration::from_millis(5),
            refresh_interval: Duration::from_millis(100),
            side_button_toggle: true,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_str(content)?;
        let defaults = Config::default();
        config.tick_interval =
            clamp_interval(config.tick_interval, defaults.tick_interval, MAX_TICK_INTERVAL);
        config.refresh_interval =
            clamp_interval(config.refresh_interval, defaults.refresh_interval, MAX_REFRESH_INTERVAL);
        Ok(config)
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("click-assist")
            .join("config.json")
    }

    pub fn button(&self, button: MouseButton) -> &AssistConfig {
        match button {
            MouseButton::Left => &self.left,
            MouseButton::Right => &self.right,
        }
    }

    /// Non-fatal problems worth showing to the user.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let click_interval = Duration::from_secs_f64(1.0 / self.global.threshold_cps());
        if self.global.idle_timeout() < click_interval {
            warnings.push(ConfigWarning::IdleTimeoutBelowThresholdInterval {
                idle_timeout: self.global.idle_timeout(),
                click_interval,
                suggested: click_interval.mul_f64(SUGGESTED_TIMEOUT_FACTOR),
            });
        }

        warnings
    }
}

/// Advisory configuration findings.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// A user clicking right at the threshold pauses longer than the idle
    /// timeout between clicks, so assist would start and stop repeatedly.
    IdleTimeoutBelowThresholdInterval {
        idle_timeout: Duration,
        click_interval: Duration,
        suggested: Duration,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::IdleTimeoutBelowThresholdInterval {
                idle_timeout,
                click_interval,
                suggested,
            } => write!(
                f,
                "idle timeout ({:.1}s) is shorter than the click interval at the threshold rate ({:.2}s); \
                 assist may start and stop repeatedly. Suggested idle timeout: {:.1}s or more",
                idle_timeout.as_secs_f64(),
                click_interval.as_secs_f64(),
                suggested.as_secs_f64()
            ),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Serde support for Duration as fractional seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {secs}"
            )));
        }
        // Out-of-range values saturate; the owning setter clamps them
        Ok(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.global.active());
        assert_eq!(config.global.threshold_cps(), 3.0);
        assert_eq!(config.global.idle_timeout(), Duration::from_millis(200));
        assert_eq!(config.left.min_cps(), 22.0);
        assert_eq!(config.right.max_cps(), 24.0);
        assert_eq!(config.tick_interval, Duration::from_millis(5));
    }

    #[test]
    fn test_min_above_max_raises_max() {
        let mut config = AssistConfig::new(10.0, 20.0, true);
        config.set_min_cps(30.0);
        assert_eq!(config.min_cps(), 30.0);
        assert_eq!(config.max_cps(), 30.0);
    }

    #[test]
    fn test_max_below_min_lowers_min() {
        let mut config = AssistConfig::new(30.0, 40.0, true);
        config.set_max_cps(20.0);
        assert_eq!(config.min_cps(), 20.0);
        assert_eq!(config.max_cps(), 20.0);
    }

    #[test]
    fn test_values_are_clamped() {
        let mut config = AssistConfig::new(0.0, 500.0, true);
        assert_eq!(config.min_cps(), MIN_TARGET_CPS);
        assert_eq!(config.max_cps(), MAX_TARGET_CPS);

        config.set_min_cps(f64::NAN);
        assert_eq!(config.min_cps(), MIN_TARGET_CPS);

        let mut global = GlobalAssistState::default();
        global.set_threshold_cps(100.0);
        assert_eq!(global.threshold_cps(), MAX_THRESHOLD_CPS);
        global.set_idle_timeout(Duration::from_millis(1));
        assert_eq!(global.idle_timeout(), MIN_IDLE_TIMEOUT);
        global.set_idle_timeout_secs(60.0);
        assert_eq!(global.idle_timeout(), MAX_IDLE_TIMEOUT);
    }

    #[test]
    fn test_inverted_range_in_file_is_corrected() {
        let json = r#"{
            "global": { "active": true, "threshold_cps": 4, "idle_timeout": 0.5 },
            "left": { "min_cps": 30, "max_cps": 20 },
            "right": { "min_cps": 12, "max_cps": 14, "enabled": false }
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.left.min_cps(), 20.0);
        assert_eq!(config.left.max_cps(), 20.0);
        assert!(config.left.enabled());
        assert!(!config.right.enabled());
        assert_eq!(config.global.idle_timeout(), Duration::from_millis(500));
        // omitted fields take defaults
        assert_eq!(config.refresh_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let json = r#"{ "global": { "threshold_cps": 3, "idle_timeout": -1 } }"#;
        assert!(matches!(Config::from_json(json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_huge_durations_are_clamped() {
        let config = Config::from_json(r#"{ "tick_interval": 1e30, "refresh_interval": 1e300 }"#)
            .unwrap();
        assert_eq!(config.tick_interval, MAX_TICK_INTERVAL);
        assert_eq!(config.refresh_interval, MAX_REFRESH_INTERVAL);

        let json = r#"{ "global": { "threshold_cps": 3, "idle_timeout": 1e25 } }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.global.idle_timeout(), MAX_IDLE_TIMEOUT);
    }

    #[test]
    fn test_zero_intervals_fall_back_to_defaults() {
        let config = Config::from_json(r#"{ "tick_interval": 0, "refresh_interval": 0 }"#).unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(5));
        assert_eq!(config.refresh_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_idle_timeout_warning() {
        let config = Config::default();
        // 3 CPS -> 0.33 s between clicks, default timeout is 0.2 s
        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        let text = warnings[0].to_string();
        assert!(text.contains("0.2s"));
        assert!(text.contains("0.6s"));

        let mut relaxed = Config::default();
        relaxed.global.set_idle_timeout(Duration::from_millis(400));
        assert!(relaxed.warnings().is_empty());
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
