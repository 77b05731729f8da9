#![forbid(unsafe_code)]

//! Observable view-model base and render notification scheduling.
//!
//! A view model embeds an [`ObservableEntity`]. Every tracked property change
//! asks the entity's [`RenderScheduler`] for a render, and the scheduler
//! decides when the host's render callback actually runs: immediately, after
//! a debounce quiet period, or throttled to one leading plus one trailing
//! invocation per window.
//!
//! Everything here is single-threaded and cooperative. The host event loop
//! drives deferred renders with [`RenderScheduler::poll`] and sleeps until
//! [`RenderScheduler::next_deadline`].
//!
//! # Features
//!
//! - `policy-config`: load a [`SchedulerConfig`] from TOML or JSON.

pub mod config;
pub mod entity;
pub mod environment;
pub mod reactive;
pub mod scheduler;

pub use config::{ConfigError, DebugMode, DelayMode, SchedulerConfig};
pub use entity::{LoadingStatus, ObservableEntity, ObservableViewModel};
pub use environment::HostEnvironment;
pub use reactive::{BindingScope, Observable, Subscription};
pub use scheduler::{PendingState, RenderScheduler, SchedulerStats, short_type_name};
