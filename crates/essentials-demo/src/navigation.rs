#![forbid(unsafe_code)]

//! Navigation menu data.

/// One entry of the application's navigation menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationItem {
    /// Menu label.
    pub text: String,
    /// CSS icon classes for the menu entry.
    pub icon: String,
    /// Route, relative to the app base.
    pub url: String,
    /// Menu group.
    pub category: String,
    /// Whether the item is listed in the menu.
    pub is_visible: bool,
    /// Heading shown on the page itself.
    pub page_title: String,
    /// Larger icon shown next to the page heading.
    pub page_icon: String,
    /// Roles allowed to see the item; `None` means any authenticated user.
    pub roles: Option<Vec<String>>,
    /// Whether signed-out users may see the item.
    pub allow_anonymous: bool,
}

impl NavigationItem {
    /// A visible, anonymous item whose page title matches its label.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        icon: impl Into<String>,
        url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let icon = icon.into();
        Self {
            page_title: text.clone(),
            page_icon: icon.clone(),
            text,
            icon,
            url: url.into(),
            category: category.into(),
            is_visible: true,
            roles: None,
            allow_anonymous: true,
        }
    }

    /// Set the page heading icon.
    #[must_use]
    pub fn page_icon(mut self, page_icon: impl Into<String>) -> Self {
        self.page_icon = page_icon.into();
        self
    }

    /// Set the page heading.
    #[must_use]
    pub fn page_title(mut self, page_title: impl Into<String>) -> Self {
        self.page_title = page_title.into();
        self
    }

    /// Keep the route but leave it out of the menu.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.is_visible = false;
        self
    }

    /// Restrict the item to `roles` and require sign-in.
    #[must_use]
    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = Some(roles.into_iter().map(Into::into).collect());
        self.allow_anonymous = false;
        self
    }

    /// Whether a user holding `roles` may see this item.
    #[must_use]
    pub fn is_allowed_for(&self, roles: &[&str]) -> bool {
        if self.allow_anonymous {
            return true;
        }
        match &self.roles {
            None => true,
            Some(required) => required.iter().any(|r| roles.contains(&r.as_str())),
        }
    }

    /// Route comparison ignoring leading/trailing slashes and case.
    #[must_use]
    pub fn matches_url(&self, url: &str) -> bool {
        normalize_route(&self.url).eq_ignore_ascii_case(normalize_route(url))
    }
}

fn normalize_route(url: &str) -> &str {
    url.trim().trim_matches('/')
}

/// The full navigation menu.
#[derive(Debug, Clone, Default)]
pub struct NavigationMenu {
    items: Vec<NavigationItem>,
}

impl NavigationMenu {
    /// An empty menu.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the menu contents.
    pub fn load(&mut self, items: impl IntoIterator<Item = NavigationItem>) {
        self.items = items.into_iter().collect();
        tracing::debug!(count = self.items.len(), "navigation items loaded");
    }

    /// Every item, hidden ones included, in load order.
    #[must_use]
    pub fn items(&self) -> &[NavigationItem] {
        &self.items
    }

    /// Items listed in the menu, in load order.
    pub fn visible_items(&self) -> impl Iterator<Item = &NavigationItem> {
        self.items.iter().filter(|item| item.is_visible)
    }

    /// Visible items grouped by category, categories in first-seen order.
    #[must_use]
    pub fn by_category(&self) -> Vec<(&str, Vec<&NavigationItem>)> {
        let mut groups: Vec<(&str, Vec<&NavigationItem>)> = Vec::new();
        for item in self.visible_items() {
            match groups.iter_mut().find(|(cat, _)| *cat == item.category) {
                Some((_, members)) => members.push(item),
                None => groups.push((item.category.as_str(), vec![item])),
            }
        }
        groups
    }

    /// The first item whose route matches `url`.
    #[must_use]
    pub fn find_by_url(&self, url: &str) -> Option<&NavigationItem> {
        self.items.iter().find(|item| item.matches_url(url))
    }

    /// Number of items, hidden ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the menu has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
