#![forbid(unsafe_code)]

//! Change-tracking primitives for view models.
//!
//! - [`Observable`]: a shared, version-tracked value with subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`BindingScope`]: holds every subscription a view model owns and wires
//!   observables to its [`RenderScheduler`](crate::RenderScheduler).
//!
//! # Architecture
//!
//! `Observable<T>` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and pruned lazily
//! during notification, so dropping a `Subscription` is all it takes to
//! disconnect.
//!
//! Mutation tracking is explicit: a view model registers each tracked
//! observable with [`BindingScope::notify_on_change`], and every change then
//! calls `request_notify()` on the scheduler. There is no hidden event
//! subscriber list on the view model itself.

pub mod binding;
pub mod observable;

pub use binding::{BindingScope, notify_on_change, notify_on_change_named};
pub use observable::{Observable, Subscription};
