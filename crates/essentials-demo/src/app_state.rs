#![forbid(unsafe_code)]

//! Application-wide view model for the demo.

use essentials_runtime::{
    DebugMode, HostEnvironment, Observable, ObservableEntity, ObservableViewModel,
    SchedulerConfig,
};

use crate::navigation::{NavigationItem, NavigationMenu};

/// Throttle window used when no config is supplied.
pub const DEFAULT_THROTTLE_MS: i64 = 100;

/// The demo's navigation menu.
#[must_use]
pub fn default_navigation() -> Vec<NavigationItem> {
    vec![
        NavigationItem::new("Dashboard", "fad fa-fw fa-desktop", "/", "Main")
            .page_icon("fad fa-fw fa-2x fa-desktop"),
        NavigationItem::new(
            "LoadingContainer Demo",
            "fad fa-fw fa-desktop",
            "LoadingContainer",
            "Controls",
        )
        .page_icon("fad fa-fw fa-2x fa-desktop"),
        NavigationItem::new("Merlin Demo", "fad fa-fw fa-desktop", "Merlin", "Controls")
            .page_icon("fad fa-fw fa-2x fa-desktop"),
        NavigationItem::new(
            "Delay StateHasChanged",
            "fad fa-fw fa-desktop",
            "DelayStateHasChanged",
            "Functionality",
        )
        .page_icon("fad fa-fw fa-2x fa-desktop"),
    ]
}

/// Shared application state: navigation, current route, sidebar.
///
/// Renders are throttled to one leading and one trailing render per
/// [`DEFAULT_THROTTLE_MS`] unless a config says otherwise. Outside
/// production the scheduler warns when no render callback is bound.
pub struct AppState {
    entity: ObservableEntity,
    environment: HostEnvironment,
    navigation: NavigationMenu,
    current_url: Observable<String>,
    is_sidebar_open: Observable<bool>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.environment.name())
            .field("current_url", &self.current_url.get())
            .field("is_sidebar_open", &self.is_sidebar_open.get())
            .field("nav_items", &self.navigation.len())
            .field("entity", &self.entity)
            .finish()
    }
}

impl AppState {
    /// Build with the default throttled scheduler.
    #[must_use]
    pub fn new(environment: HostEnvironment) -> Self {
        Self::with_config(environment, None)
    }

    /// Build with an explicit scheduler config. Outside production the debug
    /// mode is raised to `Info` regardless of the config.
    #[must_use]
    pub fn with_config(environment: HostEnvironment, config: Option<SchedulerConfig>) -> Self {
        let mut config = config.unwrap_or_else(|| SchedulerConfig::throttle(DEFAULT_THROTTLE_MS));
        if environment.default_debug_mode() == DebugMode::Info {
            config.debug_mode = DebugMode::Info;
        }

        let entity = ObservableEntity::with_config::<Self>(Some(&config));
        let current_url = Observable::new("/".to_string());
        let is_sidebar_open = Observable::new(true);
        entity.track_named("CurrentUrl", &current_url);
        entity.track_named("IsSidebarOpen", &is_sidebar_open);

        let mut navigation = NavigationMenu::new();
        navigation.load(default_navigation());

        tracing::info!(
            environment = %environment,
            delay_mode = %config.delay_mode,
            delay_interval_ms = config.delay_interval_ms,
            debug_mode = %config.debug_mode,
            "app state created"
        );

        Self {
            entity,
            environment,
            navigation,
            current_url,
            is_sidebar_open,
        }
    }

    /// Host environment the state was built for.
    #[must_use]
    pub fn environment(&self) -> &HostEnvironment {
        &self.environment
    }

    /// The loaded navigation menu.
    #[must_use]
    pub fn navigation(&self) -> &NavigationMenu {
        &self.navigation
    }

    /// Current route.
    #[must_use]
    pub fn current_url(&self) -> String {
        self.current_url.get()
    }

    /// Whether the sidebar is expanded.
    #[must_use]
    pub fn is_sidebar_open(&self) -> bool {
        self.is_sidebar_open.get()
    }

    /// Navigate to `url`, returning the matching menu item if any.
    pub fn navigate(&self, url: &str) -> Option<&NavigationItem> {
        let item = self.navigation.find_by_url(url);
        if item.is_none() {
            tracing::debug!(url, "navigating to a route outside the menu");
        }
        self.current_url.set(url.to_string());
        item
    }

    /// The menu item for the current route.
    #[must_use]
    pub fn current_item(&self) -> Option<&NavigationItem> {
        self.current_url
            .with(|url| self.navigation.find_by_url(url))
    }

    /// Flip the sidebar; requests a render.
    pub fn toggle_sidebar(&self) {
        self.is_sidebar_open.update(|open| *open = !*open);
    }

    /// Open or close the sidebar; a change requests a render.
    pub fn set_sidebar_open(&self, open: bool) {
        self.is_sidebar_open.set(open);
    }
}

impl ObservableViewModel for AppState {
    fn entity(&self) -> &ObservableEntity {
        &self.entity
    }
}
