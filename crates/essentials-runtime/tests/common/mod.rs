//! Virtual-clock event loop shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use essentials_runtime::{RenderScheduler, SchedulerConfig};
use web_time::Instant;

/// Drives a scheduler the way a host loop would, on a millisecond clock.
pub struct VirtualLoop {
    base: Instant,
    now_ms: Rc<Cell<u64>>,
    fires: Rc<RefCell<Vec<u64>>>,
    pub scheduler: Rc<RenderScheduler>,
}

impl VirtualLoop {
    pub fn new(config: SchedulerConfig) -> Self {
        let scheduler = Rc::new(RenderScheduler::from_config(config, "VirtualLoop"));
        Self::with_scheduler(scheduler)
    }

    pub fn with_scheduler(scheduler: Rc<RenderScheduler>) -> Self {
        let now_ms = Rc::new(Cell::new(0));
        let fires = Rc::new(RefCell::new(Vec::new()));
        let (clock, log) = (Rc::clone(&now_ms), Rc::clone(&fires));
        scheduler.bind(move || log.borrow_mut().push(clock.get()));
        Self {
            base: Instant::now(),
            now_ms,
            fires,
            scheduler,
        }
    }

    pub fn instant(&self, ms: u64) -> Instant {
        self.base + Duration::from_millis(ms)
    }

    /// Run due deadlines up to `ms`, then request a render at `ms`.
    pub fn request(&self, ms: u64) {
        self.run_until(ms);
        self.now_ms.set(ms);
        self.scheduler.request_notify_at(self.instant(ms));
    }

    /// Poll every deadline at or before `ms`, in order.
    pub fn run_until(&self, ms: u64) {
        while let Some(deadline) = self.scheduler.next_deadline() {
            let due = deadline.duration_since(self.base).as_millis() as u64;
            if due > ms {
                break;
            }
            self.now_ms.set(due);
            self.scheduler.poll_at(deadline);
        }
        self.now_ms.set(ms);
    }

    /// Switch the bound callback to one that records into `log`.
    pub fn rebind_into(&self, log: Rc<RefCell<Vec<u64>>>) {
        let clock = Rc::clone(&self.now_ms);
        self.scheduler.bind(move || log.borrow_mut().push(clock.get()));
    }

    pub fn fires(&self) -> Vec<u64> {
        self.fires.borrow().clone()
    }
}
