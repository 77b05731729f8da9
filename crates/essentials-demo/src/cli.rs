#![forbid(unsafe_code)]

//! Command-line surface of the demo binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use essentials_runtime::{ConfigError, DebugMode, DelayMode, HostEnvironment, SchedulerConfig};

use crate::simulation::SimulationPlan;

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("--interval-ms needs --mode debounce or throttle (config has {0})")]
    IntervalWithoutDelay(DelayMode),
}

/// Play a burst of view-model changes through a render scheduling policy.
#[derive(Debug, Parser)]
#[command(name = "essentials-demo", version, about)]
pub struct Cli {
    /// Scheduler config file (TOML, or JSON with a .json extension).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Delay mode: immediate, debounce or throttle.
    #[arg(long)]
    pub mode: Option<DelayMode>,

    /// Debounce quiet period or throttle window. Negative values clamp to 0.
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub interval_ms: Option<i64>,

    /// Debug mode: off or info. Non-production environments force info.
    #[arg(long)]
    pub debug: Option<DebugMode>,

    /// Host environment name; detected from the process environment if unset.
    #[arg(long, value_name = "NAME")]
    pub environment: Option<String>,

    /// Number of state changes to simulate.
    #[arg(long, default_value_t = 20)]
    pub events: u32,

    /// Milliseconds between simulated changes.
    #[arg(long, value_name = "MS", default_value_t = 15)]
    pub spacing_ms: u64,
}

impl Cli {
    /// Layer flags over the config file (if any) over the defaults.
    ///
    /// Returns `None` when neither a file nor any scheduler flag was given,
    /// leaving the choice to the view model.
    pub fn scheduler_config(&self) -> Result<Option<SchedulerConfig>, DemoError> {
        let from_file = self.config.as_ref().map(SchedulerConfig::load).transpose()?;
        if from_file.is_none()
            && self.mode.is_none()
            && self.interval_ms.is_none()
            && self.debug.is_none()
        {
            return Ok(None);
        }

        let mut config = from_file.unwrap_or_default();
        if let Some(mode) = self.mode {
            config.delay_mode = mode;
        }
        if let Some(interval_ms) = self.interval_ms {
            if !config.delay_mode.is_delayed() {
                return Err(DemoError::IntervalWithoutDelay(config.delay_mode));
            }
            config = SchedulerConfig::new(config.delay_mode, interval_ms, config.debug_mode);
        }
        if let Some(debug) = self.debug {
            config.debug_mode = debug;
        }
        Ok(Some(config))
    }

    #[must_use]
    pub fn host_environment(&self) -> HostEnvironment {
        self.environment
            .as_deref()
            .map_or_else(HostEnvironment::detect, HostEnvironment::new)
    }

    #[must_use]
    pub fn plan(&self) -> SimulationPlan {
        SimulationPlan {
            events: self.events,
            spacing: Duration::from_millis(self.spacing_ms),
        }
    }
}
