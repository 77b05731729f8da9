#![forbid(unsafe_code)]

//! Render notification scheduling.
//!
//! A [`RenderScheduler`] turns a high-frequency stream of "state changed"
//! requests into a lower-frequency stream of render callback invocations.
//!
//! | Mode | On request | Deferred fire |
//! |------|------------|---------------|
//! | Immediate | invoke now | never |
//! | Debounce | restart the quiet-period timer | once, `interval` after the last request |
//! | Throttle | invoke now if idle, else mark trailing | once at window end if marked |
//!
//! # Cooperative timers
//!
//! The scheduler owns no threads and no timer handles. Deferred invocations
//! are deadlines; the host event loop calls [`RenderScheduler::poll`] to fire
//! the ones that have elapsed and [`RenderScheduler::next_deadline`] to know
//! how long it may sleep. Every operation has an `*_at(now)` form that takes
//! the current instant explicitly.
//!
//! # Invariants
//!
//! 1. At most one deferred invocation is pending at any time.
//! 2. `request_notify` never blocks and never sleeps.
//! 3. `cancel` forces the idle state without firing, and is a no-op when idle.
//! 4. A deferred invocation calls whichever callback is bound when it fires,
//!    not the one bound when it was scheduled.
//! 5. The callback runs with no internal borrow held: it may re-enter the
//!    scheduler (rebind, request, cancel).
//!
//! # Callback contract
//!
//! Callbacks are fire-and-forget. They are invoked synchronously on the
//! caller's stack and must return promptly; the scheduler never awaits or
//! retries them.
//!
//! # Failure Modes
//!
//! - Unbound callback: the default callback does nothing except, when
//!   [`DebugMode::Info`] is set, emit a `WARN` naming the owner type.
//! - Callback panic: propagates to the caller of `request_notify`/`poll`.
//!   Scheduler state is already committed, so the scheduler stays usable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use crate::config::{DebugMode, DelayMode, SchedulerConfig, clamp_interval};

type RenderCallback = Rc<dyn Fn()>;

/// Where a scheduler sits in its deferral cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingState {
    /// Nothing scheduled.
    #[default]
    Idle,
    /// Debounce timer running; fires at `deadline`.
    PendingTrailing {
        /// When the deferred invocation fires.
        deadline: Instant,
    },
    /// Throttle window open after an immediate fire.
    CoolingDown {
        /// End of the cool-down window.
        window_end: Instant,
        /// Whether a request arrived during the window.
        trailing: bool,
    },
}

impl PendingState {
    /// Whether a deferred invocation is owed.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::PendingTrailing { .. } | Self::CoolingDown { trailing: true, .. }
        )
    }
}

/// Running counters for a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerStats {
    /// Calls to `request_notify`.
    pub requests: u64,
    /// Callback invocations, bound or not.
    pub fires: u64,
    /// Requests absorbed into an already-pending invocation.
    pub coalesced: u64,
    /// Pending invocations dropped by `cancel`.
    pub cancelled: u64,
    /// Invocations that hit the default callback.
    pub unbound_fires: u64,
}

/// Debounce/throttle scheduler for render callbacks.
///
/// Single-threaded: the type is neither `Send` nor `Sync`. Share it inside a
/// view model with `Rc`.
pub struct RenderScheduler {
    owner: &'static str,
    config: Cell<SchedulerConfig>,
    state: Cell<PendingState>,
    callback: RefCell<Option<RenderCallback>>,
    stats: Cell<SchedulerStats>,
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("owner", &self.owner)
            .field("config", &self.config.get())
            .field("state", &self.state.get())
            .field("bound", &self.is_bound())
            .finish()
    }
}

impl RenderScheduler {
    /// Create a scheduler for `Owner` with the given configuration.
    #[must_use]
    pub fn new<Owner: ?Sized>(config: SchedulerConfig) -> Self {
        Self::from_config(config, short_type_name::<Owner>())
    }

    /// Create a scheduler with an explicit owner name.
    #[must_use]
    pub fn from_config(config: SchedulerConfig, owner: &'static str) -> Self {
        Self {
            owner,
            config: Cell::new(config),
            state: Cell::new(PendingState::Idle),
            callback: RefCell::new(None),
            stats: Cell::new(SchedulerStats::default()),
        }
    }

    /// Seed a fresh scheduler for another owner from this one's settings.
    ///
    /// Mode, interval and debug level are copied. The clone starts idle, with
    /// zeroed stats and the default callback.
    #[must_use]
    pub fn clone_for<Owner: ?Sized>(&self) -> Self {
        Self::from_config(self.config.get(), short_type_name::<Owner>())
    }

    /// Short type name of the owning view model.
    #[must_use]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> SchedulerConfig {
        self.config.get()
    }

    /// Change mode, interval and debug level. Negative intervals clamp to 0.
    ///
    /// A pending invocation keeps its deadline; new settings apply from the
    /// next request.
    pub fn configure(&self, delay_mode: DelayMode, delay_interval_ms: i64, debug_mode: DebugMode) {
        self.set_config(SchedulerConfig {
            debug_mode,
            delay_mode,
            delay_interval_ms: clamp_interval(delay_interval_ms),
        });
    }

    /// Replace the whole configuration.
    pub fn set_config(&self, config: SchedulerConfig) {
        tracing::debug!(
            owner = self.owner,
            delay_mode = %config.delay_mode,
            delay_interval_ms = config.delay_interval_ms,
            debug_mode = %config.debug_mode,
            "render scheduler configured"
        );
        self.config.set(config);
    }

    /// Set only the debug level.
    pub fn set_debug_mode(&self, debug_mode: DebugMode) {
        let mut config = self.config.get();
        config.debug_mode = debug_mode;
        self.config.set(config);
    }

    /// Bind the render callback, replacing any previous one.
    ///
    /// A pending invocation is kept and will call the new callback.
    pub fn bind(&self, callback: impl Fn() + 'static) {
        *self.callback.borrow_mut() = Some(Rc::new(callback));
    }

    /// Restore the default (diagnostic no-op) callback.
    pub fn unbind(&self) {
        self.callback.borrow_mut().take();
    }

    /// Whether a real callback is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.callback.borrow().is_some()
    }

    /// Current pending state.
    #[must_use]
    pub fn state(&self) -> PendingState {
        self.state.get()
    }

    /// Whether a deferred invocation is owed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.get().is_pending()
    }

    /// Counters since construction.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        self.stats.get()
    }

    /// Signal that observable state changed.
    pub fn request_notify(&self) {
        self.request_notify_at(Instant::now());
    }

    /// Signal that observable state changed, at `now`.
    pub fn request_notify_at(&self, now: Instant) {
        self.bump(|s| s.requests += 1);
        let config = self.config.get();
        let interval = config.delay_interval();

        match config.delay_mode {
            DelayMode::Immediate => self.fire(),
            DelayMode::Debounce => {
                // The restarted timer is committed before any overdue fire, so
                // a callback that cancels or disposes leaves the scheduler idle.
                let previous = self.state.replace(PendingState::PendingTrailing {
                    deadline: now + interval,
                });
                match previous {
                    PendingState::PendingTrailing { deadline } if now >= deadline => {
                        // The previous burst's quiet period already elapsed.
                        self.fire();
                    }
                    state if state.is_pending() => {
                        self.bump(|s| s.coalesced += 1);
                        tracing::trace!(owner = self.owner, "debounce timer restarted");
                    }
                    _ => {}
                }
            }
            DelayMode::Throttle => match self.state.get() {
                PendingState::Idle => self.open_window(now, interval),
                PendingState::CoolingDown { window_end, .. }
                | PendingState::PendingTrailing {
                    deadline: window_end,
                } if now >= window_end => {
                    // An owed trailing fire merges into the new cycle's
                    // leading fire.
                    if self.state.get().is_pending() {
                        self.bump(|s| s.coalesced += 1);
                    }
                    self.open_window(now, interval);
                }
                PendingState::CoolingDown { window_end, .. }
                | PendingState::PendingTrailing {
                    deadline: window_end,
                } => {
                    if self.state.get().is_pending() {
                        self.bump(|s| s.coalesced += 1);
                    }
                    tracing::trace!(owner = self.owner, "throttled; trailing render marked");
                    self.state.set(PendingState::CoolingDown {
                        window_end,
                        trailing: true,
                    });
                }
            },
        }
    }

    /// Fire any deferred invocation whose deadline has passed.
    ///
    /// Returns `true` if the callback was invoked.
    pub fn poll(&self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Fire any deferred invocation whose deadline is at or before `now`.
    pub fn poll_at(&self, now: Instant) -> bool {
        match self.state.get() {
            PendingState::PendingTrailing { deadline } if now >= deadline => {
                self.state.set(PendingState::Idle);
                tracing::debug!(owner = self.owner, "deferred render fired");
                self.fire();
                true
            }
            PendingState::CoolingDown {
                window_end,
                trailing,
            } if now >= window_end => {
                self.state.set(PendingState::Idle);
                if trailing {
                    tracing::debug!(owner = self.owner, "trailing render fired");
                    self.fire();
                }
                trailing
            }
            _ => false,
        }
    }

    /// When the next deferred invocation is due, if one is owed.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state.get() {
            PendingState::PendingTrailing { deadline } => Some(deadline),
            PendingState::CoolingDown {
                window_end,
                trailing: true,
            } => Some(window_end),
            _ => None,
        }
    }

    /// Time left until the next deferred invocation, saturating at zero.
    #[must_use]
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Drop any pending invocation without firing it.
    pub fn cancel(&self) {
        let state = self.state.replace(PendingState::Idle);
        if state.is_pending() {
            self.bump(|s| s.cancelled += 1);
            tracing::debug!(owner = self.owner, "pending render cancelled");
        }
    }

    fn open_window(&self, now: Instant, interval: Duration) {
        self.state.set(PendingState::CoolingDown {
            window_end: now + interval,
            trailing: false,
        });
        self.fire();
    }

    fn fire(&self) {
        self.bump(|s| s.fires += 1);
        // Clone out so the callback can rebind without a borrow conflict.
        let callback = self.callback.borrow().clone();
        match callback {
            Some(callback) => callback(),
            None => self.fire_unbound(),
        }
    }

    fn fire_unbound(&self) {
        self.bump(|s| s.unbound_fires += 1);
        if self.config.get().debug_mode != DebugMode::Off {
            tracing::warn!(
                owner = self.owner,
                "{} called the empty render callback. Bind one with `scheduler().bind(..)` when the view initializes",
                self.owner
            );
        }
    }

    fn bump(&self, f: impl FnOnce(&mut SchedulerStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

/// Last path segment of a type name, without generic arguments.
#[must_use]
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Harness {
        base: Instant,
        clock: Rc<Cell<u64>>,
        fires: Rc<RefCell<Vec<u64>>>,
        scheduler: RenderScheduler,
    }

    impl Harness {
        fn new(config: SchedulerConfig) -> Self {
            let clock = Rc::new(Cell::new(0));
            let fires = Rc::new(RefCell::new(Vec::new()));
            let scheduler = RenderScheduler::from_config(config, "Harness");
            let (c, f) = (Rc::clone(&clock), Rc::clone(&fires));
            scheduler.bind(move || f.borrow_mut().push(c.get()));
            Self {
                base: Instant::now(),
                clock,
                fires,
                scheduler,
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.clock.set(ms);
            self.base + Duration::from_millis(ms)
        }

        fn request(&self, ms: u64) {
            let now = self.at(ms);
            self.scheduler.request_notify_at(now);
        }

        /// Run the cooperative loop up to `ms`, polling at each deadline.
        fn advance_to(&self, ms: u64) {
            while let Some(deadline) = self.scheduler.next_deadline() {
                let due = (deadline - self.base).as_millis() as u64;
                if due > ms {
                    break;
                }
                let now = self.at(due);
                self.scheduler.poll_at(now);
            }
            self.clock.set(ms);
        }

        fn fires(&self) -> Vec<u64> {
            self.fires.borrow().clone()
        }
    }

    #[test]
    fn immediate_fires_every_request() {
        let h = Harness::new(SchedulerConfig::immediate());
        for t in [0, 10, 20] {
            h.request(t);
        }
        assert_eq!(h.fires(), vec![0, 10, 20]);
        assert_eq!(h.scheduler.state(), PendingState::Idle);
    }

    #[test]
    fn debounce_fires_once_after_last_request() {
        let h = Harness::new(SchedulerConfig::debounce(100));
        h.request(0);
        h.advance_to(30);
        h.request(30);
        h.advance_to(60);
        h.request(60);
        h.advance_to(159);
        assert!(h.fires().is_empty());
        h.advance_to(500);
        assert_eq!(h.fires(), vec![160]);
        assert_eq!(h.scheduler.stats().coalesced, 2);
    }

    #[test]
    fn throttle_leading_trailing_then_new_cycle() {
        let h = Harness::new(SchedulerConfig::throttle(100));
        h.request(0);
        h.advance_to(50);
        h.request(50);
        h.advance_to(120);
        h.request(120);
        assert_eq!(h.fires(), vec![0, 100, 120]);
    }

    #[test]
    fn throttle_without_calls_in_window_has_no_trailing_fire() {
        let h = Harness::new(SchedulerConfig::throttle(100));
        h.request(0);
        assert_eq!(h.scheduler.next_deadline(), None);
        h.advance_to(1_000);
        assert_eq!(h.fires(), vec![0]);
    }

    #[test]
    fn throttle_burst_collapses_to_one_trailing_fire() {
        let h = Harness::new(SchedulerConfig::throttle(100));
        for t in [0, 10, 20, 30, 99] {
            h.request(t);
        }
        h.advance_to(300);
        assert_eq!(h.fires(), vec![0, 100]);
        assert_eq!(h.scheduler.stats().coalesced, 3);
    }

    #[test]
    fn throttle_overdue_trailing_merges_into_leading_fire() {
        let h = Harness::new(SchedulerConfig::throttle(100));
        h.request(0);
        h.request(50);
        // Host never polled at 100.
        h.request(150);
        assert_eq!(h.fires(), vec![0, 150]);
        h.advance_to(400);
        assert_eq!(h.fires(), vec![0, 150]);
    }

    #[test]
    fn debounce_overdue_deadline_fires_before_restarting() {
        let h = Harness::new(SchedulerConfig::debounce(100));
        h.request(0);
        h.request(250);
        assert_eq!(h.fires(), vec![250]);
        h.advance_to(400);
        assert_eq!(h.fires(), vec![250, 350]);
    }

    #[test]
    fn cancel_drops_pending_invocation() {
        let h = Harness::new(SchedulerConfig::debounce(100));
        h.request(0);
        assert!(h.scheduler.is_pending());
        h.scheduler.cancel();
        assert!(!h.scheduler.is_pending());
        h.advance_to(1_000);
        let now = h.at(1_000);
        assert!(!h.scheduler.poll_at(now));
        assert!(h.fires().is_empty());
        assert_eq!(h.scheduler.stats().cancelled, 1);
    }

    #[test]
    fn cancel_when_idle_is_noop() {
        let h = Harness::new(SchedulerConfig::throttle(100));
        h.scheduler.cancel();
        assert_eq!(h.scheduler.state(), PendingState::Idle);
        assert_eq!(h.scheduler.stats().cancelled, 0);
    }

    #[test]
    fn rebinding_uses_new_callback_for_pending_fire() {
        let h = Harness::new(SchedulerConfig::debounce(100));
        h.request(0);

        let hits = Rc::new(Cell::new(0));
        let hh = Rc::clone(&hits);
        h.scheduler.bind(move || hh.set(hh.get() + 1));
        assert!(h.scheduler.is_pending(), "rebinding must not cancel");

        h.advance_to(200);
        assert!(h.fires().is_empty());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn unbound_callback_is_counted_not_fatal() {
        let scheduler = RenderScheduler::from_config(
            SchedulerConfig::immediate().with_debug_mode(DebugMode::Info),
            "Orphan",
        );
        scheduler.request_notify();
        scheduler.request_notify();
        let stats = scheduler.stats();
        assert_eq!(stats.fires, 2);
        assert_eq!(stats.unbound_fires, 2);
    }

    #[test]
    fn unbind_restores_default_callback() {
        let h = Harness::new(SchedulerConfig::immediate());
        h.scheduler.unbind();
        assert!(!h.scheduler.is_bound());
        h.request(0);
        assert!(h.fires().is_empty());
        assert_eq!(h.scheduler.stats().unbound_fires, 1);
    }

    #[test]
    fn clone_for_copies_settings_but_not_state() {
        let h = Harness::new(SchedulerConfig::throttle(100).with_debug_mode(DebugMode::Info));
        h.request(0);
        h.request(10);
        assert!(h.scheduler.is_pending());

        struct Other;
        let clone = h.scheduler.clone_for::<Other>();
        assert_eq!(clone.config(), h.scheduler.config());
        assert_eq!(clone.state(), PendingState::Idle);
        assert_eq!(clone.stats(), SchedulerStats::default());
        assert!(!clone.is_bound());
        assert_eq!(clone.owner(), "Other");
    }

    #[test]
    fn reconfigure_keeps_pending_deadline() {
        let h = Harness::new(SchedulerConfig::debounce(100));
        h.request(0);
        h.scheduler.configure(DelayMode::Immediate, 0, DebugMode::Off);
        h.advance_to(100);
        assert_eq!(h.fires(), vec![100]);
        h.request(150);
        assert_eq!(h.fires(), vec![100, 150]);
    }

    #[test]
    fn configure_clamps_negative_interval() {
        let scheduler = RenderScheduler::from_config(SchedulerConfig::default(), "X");
        scheduler.configure(DelayMode::Throttle, -10, DebugMode::Off);
        assert_eq!(scheduler.config().delay_interval_ms, 0);
    }

    #[test]
    fn zero_interval_throttle_fires_every_request() {
        let h = Harness::new(SchedulerConfig::throttle(0));
        h.request(0);
        h.request(0);
        h.request(5);
        assert_eq!(h.fires(), vec![0, 0, 5]);
    }

    #[test]
    fn callback_may_rebind_scheduler() {
        let scheduler = Rc::new(RenderScheduler::from_config(
            SchedulerConfig::immediate(),
            "Reentrant",
        ));
        let weak = Rc::downgrade(&scheduler);
        let second = Rc::new(Cell::new(false));
        let s = Rc::clone(&second);
        scheduler.bind(move || {
            if let Some(scheduler) = weak.upgrade() {
                let s = Rc::clone(&s);
                scheduler.bind(move || s.set(true));
            }
        });
        scheduler.request_notify();
        assert!(!second.get());
        scheduler.request_notify();
        assert!(second.get());
    }

    /// Scheduler whose callback cancels it from inside the fire.
    fn self_cancelling(config: SchedulerConfig) -> (Rc<RenderScheduler>, Rc<Cell<u32>>) {
        let scheduler = Rc::new(RenderScheduler::from_config(config, "SelfCancelling"));
        let fires = Rc::new(Cell::new(0));
        let (weak, f) = (Rc::downgrade(&scheduler), Rc::clone(&fires));
        scheduler.bind(move || {
            f.set(f.get() + 1);
            if let Some(scheduler) = weak.upgrade() {
                scheduler.cancel();
            }
        });
        (scheduler, fires)
    }

    #[test]
    fn callback_cancel_during_overdue_debounce_fire_sticks() {
        let (scheduler, fires) = self_cancelling(SchedulerConfig::debounce(100));
        let base = Instant::now();
        scheduler.request_notify_at(base);
        // Deadline at 100 was never polled.
        scheduler.request_notify_at(base + Duration::from_millis(250));
        assert_eq!(fires.get(), 1);
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.next_deadline(), None);
        assert!(!scheduler.poll_at(base + Duration::from_millis(1_000)));
        assert_eq!(fires.get(), 1);
    }

    #[test]
    fn callback_cancel_during_throttle_leading_fire_sticks() {
        let (scheduler, fires) = self_cancelling(SchedulerConfig::throttle(100));
        let base = Instant::now();
        scheduler.request_notify_at(base);
        assert_eq!(fires.get(), 1);
        assert!(!scheduler.is_pending());
        assert!(!scheduler.poll_at(base + Duration::from_millis(1_000)));
        assert_eq!(fires.get(), 1);
    }

    #[test]
    fn callback_cancel_during_merged_throttle_fire_sticks() {
        let h = Harness::new(SchedulerConfig::throttle(100));
        h.request(0);
        h.request(50);
        assert!(h.scheduler.is_pending());

        let cancels = Rc::new(Cell::new(0));
        let scheduler = Rc::new(h.scheduler);
        let (weak, c) = (Rc::downgrade(&scheduler), Rc::clone(&cancels));
        scheduler.bind(move || {
            c.set(c.get() + 1);
            if let Some(scheduler) = weak.upgrade() {
                scheduler.cancel();
            }
        });

        // Trailing fire at 100 was never polled; it merges into this one.
        scheduler.request_notify_at(h.base + Duration::from_millis(150));
        assert_eq!(cancels.get(), 1);
        assert!(!scheduler.is_pending());
        assert!(!scheduler.poll_at(h.base + Duration::from_millis(1_000)));
        assert_eq!(cancels.get(), 1);
    }

    #[test]
    fn time_until_next_saturates() {
        let h = Harness::new(SchedulerConfig::debounce(100));
        h.request(0);
        assert_eq!(
            h.scheduler.time_until_next(h.at(40)),
            Some(Duration::from_millis(60))
        );
        assert_eq!(h.scheduler.time_until_next(h.at(500)), Some(Duration::ZERO));
    }

    #[test]
    fn short_type_name_strips_path_and_generics() {
        struct Plain;
        assert_eq!(short_type_name::<Plain>(), "Plain");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
        assert_eq!(short_type_name::<str>(), "str");
    }
}
