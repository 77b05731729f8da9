#![forbid(unsafe_code)]

//! Host environment detection.
//!
//! A [`HostEnvironment`] names the deployment the view models run in
//! (`Production`, `Staging`, `Development`, or anything custom). View models
//! use it to decide how chatty their render scheduler should be: outside
//! production an unbound render callback is worth a warning.

use std::env;

use crate::config::DebugMode;

/// Primary environment variable consulted by [`HostEnvironment::detect`].
pub const ENVIRONMENT_VAR: &str = "ESSENTIALS_ENVIRONMENT";
/// Fallback environment variable.
pub const FALLBACK_ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Canonical production name.
pub const PRODUCTION: &str = "Production";
/// Canonical staging name.
pub const STAGING: &str = "Staging";
/// Canonical development name.
pub const DEVELOPMENT: &str = "Development";

/// The named environment a host is running in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEnvironment {
    name: String,
}

impl HostEnvironment {
    /// Create an environment with the given name. Blank names mean production.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: normalize_environment(&name).unwrap_or_else(|| PRODUCTION.to_string()),
        }
    }

    /// Production environment.
    #[must_use]
    pub fn production() -> Self {
        Self::new(PRODUCTION)
    }

    /// Development environment.
    #[must_use]
    pub fn development() -> Self {
        Self::new(DEVELOPMENT)
    }

    /// Detect from the process environment.
    ///
    /// Preference order: `ESSENTIALS_ENVIRONMENT`, then `APP_ENVIRONMENT`.
    /// Falls back to `Production` when neither is set.
    #[must_use]
    pub fn detect() -> Self {
        let primary = env::var(ENVIRONMENT_VAR).ok();
        let fallback = env::var(FALLBACK_ENVIRONMENT_VAR).ok();
        detect_environment_from(primary.as_deref(), fallback.as_deref())
    }

    /// Environment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name comparison.
    #[must_use]
    pub fn is_environment(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.is_environment(PRODUCTION)
    }

    #[must_use]
    pub fn is_staging(&self) -> bool {
        self.is_environment(STAGING)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        self.is_environment(DEVELOPMENT)
    }

    /// `Info` everywhere except production.
    #[must_use]
    pub fn default_debug_mode(&self) -> DebugMode {
        if self.is_production() {
            DebugMode::Off
        } else {
            DebugMode::Info
        }
    }
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self::production()
    }
}

impl std::fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

fn detect_environment_from(primary: Option<&str>, fallback: Option<&str>) -> HostEnvironment {
    let name = primary
        .and_then(normalize_environment)
        .or_else(|| fallback.and_then(normalize_environment))
        .unwrap_or_else(|| PRODUCTION.to_string());
    HostEnvironment { name }
}

fn normalize_environment(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // Well-known short forms map onto the canonical names.
    let canonical = match raw.to_ascii_lowercase().as_str() {
        "prod" | "production" => PRODUCTION,
        "stage" | "staging" => STAGING,
        "dev" | "development" => DEVELOPMENT,
        _ => return Some(raw.to_string()),
    };
    Some(canonical.to_string())
}
