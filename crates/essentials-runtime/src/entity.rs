#![forbid(unsafe_code)]

//! Observable view-model base.
//!
//! [`ObservableEntity`] is the piece a view model embeds to become
//! observable: a tracked [`LoadingStatus`], a [`RenderScheduler`] scoped to
//! the view model's lifetime, and a [`BindingScope`] holding the
//! subscriptions of every tracked property.
//!
//! ```
//! use essentials_runtime::{LoadingStatus, ObservableEntity, ObservableViewModel};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! struct Orders {
//!     entity: ObservableEntity,
//! }
//!
//! impl ObservableViewModel for Orders {
//!     fn entity(&self) -> &ObservableEntity {
//!         &self.entity
//!     }
//! }
//!
//! let orders = Orders { entity: ObservableEntity::new::<Orders>() };
//! let renders = Rc::new(Cell::new(0));
//! let r = Rc::clone(&renders);
//! orders.bind_render(move || r.set(r.get() + 1));
//!
//! orders.set_loading_status(LoadingStatus::Loading);
//! orders.set_loading_status(LoadingStatus::Loaded);
//! assert_eq!(renders.get(), 2);
//! ```
//!
//! # Invariants
//!
//! 1. Each entity owns exactly one scheduler; schedulers are never shared
//!    between entities, so cool-down state is per entity.
//! 2. After `dispose()` no pending render fires and no tracked property
//!    requests a render.
//! 3. `dispose()` is idempotent and runs on drop.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::config::SchedulerConfig;
use crate::reactive::{BindingScope, Observable};
use crate::scheduler::{RenderScheduler, short_type_name};

/// Readiness of the data backing a view model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum LoadingStatus {
    /// Nothing requested yet.
    #[default]
    NotLoaded,
    /// A fetch is in flight.
    Loading,
    /// Data is available.
    Loaded,
    /// The last fetch failed.
    Failed,
}

impl LoadingStatus {
    /// Whether data is available.
    #[must_use]
    pub const fn is_loaded(self) -> bool {
        matches!(self, Self::Loaded)
    }

    /// Whether a fetch is in flight.
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the last fetch failed.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Lowercase, hyphenated name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotLoaded => "not-loaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LoadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state shared by every view model.
pub struct ObservableEntity {
    loading_status: Observable<LoadingStatus>,
    scheduler: Rc<RenderScheduler>,
    scope: RefCell<BindingScope>,
    disposed: Cell<bool>,
}

impl std::fmt::Debug for ObservableEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableEntity")
            .field("owner", &self.owner())
            .field("loading_status", &self.loading_status())
            .field("scheduler", &self.scheduler)
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

impl ObservableEntity {
    /// Entity for `Owner` with the default (immediate, silent) scheduler.
    #[must_use]
    pub fn new<Owner: ?Sized>() -> Self {
        Self::with_config::<Owner>(None)
    }

    /// Entity for `Owner`, seeding its scheduler from `template` if given.
    #[must_use]
    pub fn with_config<Owner: ?Sized>(template: Option<&SchedulerConfig>) -> Self {
        let config = template.copied().unwrap_or_default();
        Self::from_scheduler(RenderScheduler::from_config(
            config,
            short_type_name::<Owner>(),
        ))
    }

    /// Entity for `Owner` whose scheduler is cloned from an existing one.
    #[must_use]
    pub fn from_template<Owner: ?Sized>(template: &RenderScheduler) -> Self {
        Self::from_scheduler(template.clone_for::<Owner>())
    }

    fn from_scheduler(scheduler: RenderScheduler) -> Self {
        let scheduler = Rc::new(scheduler);
        let loading_status = Observable::new(LoadingStatus::NotLoaded);
        let mut scope = BindingScope::new();
        scope.notify_on_change_named("LoadingStatus", &loading_status, &scheduler);
        Self {
            loading_status,
            scheduler,
            scope: RefCell::new(scope),
            disposed: Cell::new(false),
        }
    }

    /// Short type name of the owning view model.
    #[must_use]
    pub fn owner(&self) -> &'static str {
        self.scheduler.owner()
    }

    /// Current loading status.
    #[must_use]
    pub fn loading_status(&self) -> LoadingStatus {
        self.loading_status.get()
    }

    /// Set the loading status; a change requests a render.
    pub fn set_loading_status(&self, status: LoadingStatus) {
        self.loading_status.set(status);
    }

    /// The loading status as an observable, for bindings.
    #[must_use]
    pub fn loading_status_observable(&self) -> &Observable<LoadingStatus> {
        &self.loading_status
    }

    /// The render scheduler owned by this entity.
    #[must_use]
    pub fn scheduler(&self) -> &Rc<RenderScheduler> {
        &self.scheduler
    }

    /// Request a render whenever `source` changes.
    pub fn track<T: Clone + PartialEq + 'static>(&self, source: &Observable<T>) {
        if self.reject_after_dispose() {
            return;
        }
        self.scope
            .borrow_mut()
            .notify_on_change(source, &self.scheduler);
    }

    /// Like [`ObservableEntity::track`], logging `Owner.property changed`.
    pub fn track_named<T: Clone + PartialEq + 'static>(
        &self,
        property: &'static str,
        source: &Observable<T>,
    ) {
        if self.reject_after_dispose() {
            return;
        }
        self.scope
            .borrow_mut()
            .notify_on_change_named(property, source, &self.scheduler);
    }

    /// Number of tracked properties, including the loading status.
    #[must_use]
    pub fn tracked_count(&self) -> usize {
        self.scope.borrow().binding_count()
    }

    /// Whether `dispose` has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Cancel any pending render and release every tracked property.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.scheduler.cancel();
        self.scope.borrow_mut().clear();
        tracing::debug!(owner = self.owner(), "observable entity disposed");
    }

    fn reject_after_dispose(&self) -> bool {
        if self.disposed.get() {
            tracing::debug!(
                owner = self.owner(),
                "ignoring tracked property on disposed entity"
            );
        }
        self.disposed.get()
    }
}

impl Drop for ObservableEntity {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// A view model built on an [`ObservableEntity`].
///
/// Implementors only provide `entity()`; the rest is derived.
pub trait ObservableViewModel {
    /// The embedded entity.
    fn entity(&self) -> &ObservableEntity;

    /// Current loading status.
    fn loading_status(&self) -> LoadingStatus {
        self.entity().loading_status()
    }

    /// Set the loading status; a change requests a render.
    fn set_loading_status(&self, status: LoadingStatus) {
        self.entity().set_loading_status(status);
    }

    /// Bind the host's render trigger. Call this when the view initializes.
    fn bind_render(&self, callback: impl Fn() + 'static)
    where
        Self: Sized,
    {
        self.entity().scheduler().bind(callback);
    }

    /// Fire any deferred render that is due.
    fn poll_render(&self) -> bool {
        self.entity().scheduler().poll()
    }

    /// Cancel pending renders and release tracked properties.
    fn dispose(&self) {
        self.entity().dispose();
    }
}
