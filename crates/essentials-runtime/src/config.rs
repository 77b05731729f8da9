#![forbid(unsafe_code)]

//! Render scheduling policy as data.
//!
//! [`SchedulerConfig`] is the explicit configuration value handed to a
//! [`RenderScheduler`](crate::RenderScheduler) at construction. It replaces
//! shared mutable debug flags: every scheduler owns a copy, so instances
//! stay independently testable.
//!
//! With the `policy-config` feature the config can be loaded from TOML or
//! JSON:
//!
//! ```toml
//! debug_mode = "info"
//! delay_mode = "throttle"
//! delay_interval_ms = 100
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Unknown mode name | `delay_mode = "sometimes"` | [`ConfigError::UnknownDelayMode`] |
//! | Negative interval | `delay_interval_ms = -5` | Clamped to 0 |
//! | Unreadable file | I/O failure | [`ConfigError::Io`] |
//! | Malformed document | Syntax error | [`ConfigError::Parse`] |

use std::str::FromStr;
use std::time::Duration;

/// Whether a scheduler reports misconfiguration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum DebugMode {
    /// Silent.
    #[default]
    Off,
    /// Warn whenever the default (unbound) callback is invoked.
    Info,
}

impl DebugMode {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Info => "info",
        }
    }
}

impl FromStr for DebugMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "info" => Ok(Self::Info),
            _ => Err(ConfigError::UnknownDebugMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for DebugMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How render requests are turned into callback invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Deserialize, serde::Serialize),
    serde(rename_all = "lowercase")
)]
pub enum DelayMode {
    /// Invoke synchronously on every request.
    #[default]
    Immediate,
    /// Invoke once after requests stop arriving for the interval.
    Debounce,
    /// Invoke at once, then at most one trailing invocation per interval.
    Throttle,
}

impl DelayMode {
    /// Lowercase name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Debounce => "debounce",
            Self::Throttle => "throttle",
        }
    }

    /// Whether requests may be deferred.
    #[must_use]
    pub const fn is_delayed(self) -> bool {
        !matches!(self, Self::Immediate)
    }
}

impl FromStr for DelayMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" | "none" => Ok(Self::Immediate),
            "debounce" => Ok(Self::Debounce),
            "throttle" => Ok(Self::Throttle),
            _ => Err(ConfigError::UnknownDelayMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for DelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from building or loading a [`SchedulerConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// A delay mode name did not match any known mode.
    UnknownDelayMode(String),
    /// A debug mode name did not match any known mode.
    UnknownDebugMode(String),
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config document was malformed.
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDelayMode(m) => write!(
                f,
                "unknown delay mode '{m}' (expected immediate, debounce or throttle)"
            ),
            Self::UnknownDebugMode(m) => {
                write!(f, "unknown debug mode '{m}' (expected off or info)")
            }
            Self::Io(e) => write!(f, "failed to read scheduler config: {e}"),
            Self::Parse(msg) => write!(f, "invalid scheduler config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Explicit render scheduling configuration.
///
/// The interval is stored in whole milliseconds and is never negative;
/// [`SchedulerConfig::new`] clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "policy-config",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct SchedulerConfig {
    /// Diagnostic level.
    pub debug_mode: DebugMode,
    /// Scheduling policy.
    pub delay_mode: DelayMode,
    /// Debounce quiet period or throttle window, in milliseconds.
    #[cfg_attr(
        feature = "policy-config",
        serde(deserialize_with = "clamped_interval")
    )]
    pub delay_interval_ms: u64,
}

impl SchedulerConfig {
    /// Build a config, clamping a negative interval to zero.
    #[must_use]
    pub fn new(delay_mode: DelayMode, delay_interval_ms: i64, debug_mode: DebugMode) -> Self {
        Self {
            debug_mode,
            delay_mode,
            delay_interval_ms: clamp_interval(delay_interval_ms),
        }
    }

    /// Immediate mode, debug off.
    #[must_use]
    pub fn immediate() -> Self {
        Self::default()
    }

    /// Debounce with the given quiet period.
    #[must_use]
    pub fn debounce(delay_interval_ms: i64) -> Self {
        Self::new(DelayMode::Debounce, delay_interval_ms, DebugMode::Off)
    }

    /// Throttle with the given window.
    #[must_use]
    pub fn throttle(delay_interval_ms: i64) -> Self {
        Self::new(DelayMode::Throttle, delay_interval_ms, DebugMode::Off)
    }

    /// Same config with a different debug mode.
    #[must_use]
    pub fn with_debug_mode(mut self, debug_mode: DebugMode) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    /// The interval as a [`Duration`]. Zero for immediate mode.
    #[must_use]
    pub fn delay_interval(&self) -> Duration {
        if self.delay_mode.is_delayed() {
            Duration::from_millis(self.delay_interval_ms)
        } else {
            Duration::ZERO
        }
    }
}

/// Negative intervals clamp to zero.
#[must_use]
pub fn clamp_interval(delay_interval_ms: i64) -> u64 {
    u64::try_from(delay_interval_ms).unwrap_or(0)
}

#[cfg(feature = "policy-config")]
fn clamped_interval<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;
    let raw = i64::deserialize(deserializer)?;
    Ok(clamp_interval(raw))
}

#[cfg(feature = "policy-config")]
impl SchedulerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a file. `.json` files parse as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_toml_str(&text)?
        };
        tracing::debug!(
            path = %path.display(),
            delay_mode = %config.delay_mode,
            delay_interval_ms = config.delay_interval_ms,
            debug_mode = %config.debug_mode,
            "loaded scheduler config"
        );
        Ok(config)
    }
}
