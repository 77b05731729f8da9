#![forbid(unsafe_code)]

//! Wiring observable properties to a render scheduler.
//!
//! [`notify_on_change`] turns every change of an [`Observable`] into a
//! `request_notify()` on a [`RenderScheduler`]. [`BindingScope`] owns those
//! subscriptions for one view model so they can be released together.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use essentials_runtime::reactive::{BindingScope, Observable};
//! use essentials_runtime::{RenderScheduler, SchedulerConfig};
//!
//! let scheduler = Rc::new(RenderScheduler::from_config(SchedulerConfig::immediate(), "Counter"));
//! let count = Observable::new(0);
//!
//! let mut scope = BindingScope::new();
//! scope.notify_on_change(&count, &scheduler);
//!
//! count.set(1);
//! assert_eq!(scheduler.stats().requests, 1);
//!
//! scope.clear();
//! count.set(2);
//! assert_eq!(scheduler.stats().requests, 1);
//! ```
//!
//! # Invariants
//!
//! 1. Subscriptions hold the scheduler weakly: a scope never keeps its
//!    scheduler alive, and a change after the scheduler is gone is ignored.
//! 2. After the scope is dropped or cleared, no callback from it fires.
//! 3. `binding_count()` always matches the number of held subscriptions.

use std::rc::Rc;

use super::observable::{Observable, Subscription};
use crate::scheduler::RenderScheduler;

/// Subscribe `scheduler` to changes of `source`.
#[must_use = "dropping the subscription disconnects the observable"]
pub fn notify_on_change<T: Clone + PartialEq + 'static>(
    source: &Observable<T>,
    scheduler: &Rc<RenderScheduler>,
) -> Subscription {
    let weak = Rc::downgrade(scheduler);
    source.subscribe(move |_| {
        if let Some(scheduler) = weak.upgrade() {
            scheduler.request_notify();
        }
    })
}

/// Like [`notify_on_change`], logging `Owner.property changed` at debug level
/// before requesting a render.
#[must_use = "dropping the subscription disconnects the observable"]
pub fn notify_on_change_named<T: Clone + PartialEq + 'static>(
    property: &'static str,
    source: &Observable<T>,
    scheduler: &Rc<RenderScheduler>,
) -> Subscription {
    let weak = Rc::downgrade(scheduler);
    source.subscribe(move |_| {
        if let Some(scheduler) = weak.upgrade() {
            tracing::debug!(
                owner = scheduler.owner(),
                property,
                "{}.{} changed",
                scheduler.owner(),
                property
            );
            scheduler.request_notify();
        }
    })
}

/// The render wiring of one view model.
///
/// Every tracked property of an [`ObservableEntity`](crate::ObservableEntity)
/// lands here. Dropping or clearing the scope stops those properties from
/// requesting renders.
#[derive(Default)]
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    /// A scope tracking no properties yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Adopt a subscription made elsewhere, tying it to the view model.
    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Attach a non-render reaction to `source` for the view model's lifetime.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        self.subscriptions.push(source.subscribe(callback));
        self
    }

    /// Request a render on `scheduler` whenever `source` changes.
    pub fn notify_on_change<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        scheduler: &Rc<RenderScheduler>,
    ) -> &mut Self {
        self.subscriptions.push(notify_on_change(source, scheduler));
        self
    }

    /// Named variant of [`BindingScope::notify_on_change`].
    pub fn notify_on_change_named<T: Clone + PartialEq + 'static>(
        &mut self,
        property: &'static str,
        source: &Observable<T>,
        scheduler: &Rc<RenderScheduler>,
    ) -> &mut Self {
        self.subscriptions
            .push(notify_on_change_named(property, source, scheduler));
        self
    }

    /// Number of live bindings, render wiring and reactions together.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the view model tracks nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Disconnect every binding. New ones may be added afterwards.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl std::fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingScope")
            .field("bindings", &self.subscriptions.len())
            .finish()
    }
}
