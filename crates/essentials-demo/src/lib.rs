#![forbid(unsafe_code)]

//! Demo application for `essentials-runtime`.
//!
//! An [`AppState`](app_state::AppState) view model owns the navigation menu
//! and a few tracked properties; [`simulation`] plays a burst of state
//! changes through a cooperative host loop so the effect of each render
//! scheduling policy is visible in the logs.

pub mod app_state;
pub mod cli;
pub mod navigation;
pub mod simulation;

pub use app_state::AppState;
pub use navigation::{NavigationItem, NavigationMenu};
