#![forbid(unsafe_code)]

//! A cooperative host loop driving [`AppState`] mutations.
//!
//! Mirrors what a UI host does: apply state changes as they arrive, sleep
//! until either the next change or the scheduler's next deadline, and poll
//! the scheduler so deferred renders fire on the loop's own thread.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use essentials_runtime::{LoadingStatus, ObservableViewModel, SchedulerStats};
use web_time::Instant;

use crate::app_state::AppState;

/// Shape of a simulated mutation burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPlan {
    /// Number of state mutations.
    pub events: u32,
    /// Delay between consecutive mutations.
    pub spacing: Duration,
}

impl Default for SimulationPlan {
    fn default() -> Self {
        Self {
            events: 20,
            spacing: Duration::from_millis(15),
        }
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    /// Mutations applied.
    pub events: u32,
    /// Render callback invocations observed.
    pub renders: u32,
    /// Scheduler counters at the end of the run.
    pub stats: SchedulerStats,
    /// Wall time from first mutation to last render.
    pub elapsed: Duration,
}

impl std::fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} events -> {} renders ({} coalesced, {} unbound) in {:?}",
            self.events, self.renders, self.stats.coalesced, self.stats.unbound_fires, self.elapsed
        )
    }
}

/// Bind a counting render callback and play `plan` against `app`.
///
/// Every event changes exactly one tracked property, so the scheduler sees
/// one request per event.
pub fn run(app: &AppState, plan: SimulationPlan) -> SimulationReport {
    let renders = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&renders);
    let start = Instant::now();
    app.bind_render(move || {
        counter.set(counter.get() + 1);
        tracing::info!(
            render = counter.get(),
            at_ms = start.elapsed().as_millis() as u64,
            "render"
        );
    });

    for i in 0..plan.events {
        pump_until(app, start + plan.spacing * i);
        apply_event(app, i);
    }
    drain(app);

    SimulationReport {
        events: plan.events,
        renders: renders.get(),
        stats: app.entity().scheduler().stats(),
        elapsed: start.elapsed(),
    }
}

/// One property change per event: navigate, toggle the sidebar, or flip the
/// loading status.
fn apply_event(app: &AppState, i: u32) {
    let round = (i / 3) as usize;
    match i % 3 {
        0 => {
            let items = app.navigation().items();
            if !items.is_empty() {
                let url = items[(round + 1) % items.len()].url.clone();
                app.navigate(&url);
            }
        }
        1 => app.toggle_sidebar(),
        _ => {
            let status = if round % 2 == 0 {
                LoadingStatus::Loading
            } else {
                LoadingStatus::Loaded
            };
            app.set_loading_status(status);
        }
    }
}

/// Poll deferred renders until `target`, sleeping between deadlines.
fn pump_until(app: &AppState, target: Instant) {
    let scheduler = app.entity().scheduler();
    loop {
        let now = Instant::now();
        if now >= target {
            scheduler.poll_at(now);
            return;
        }
        let wake = scheduler
            .next_deadline()
            .map_or(target, |deadline| deadline.min(target));
        std::thread::sleep(wake.saturating_duration_since(now));
        scheduler.poll();
    }
}

/// Fire every remaining deferred render.
fn drain(app: &AppState) {
    let scheduler = app.entity().scheduler();
    while let Some(deadline) = scheduler.next_deadline() {
        std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
        scheduler.poll();
    }
}
