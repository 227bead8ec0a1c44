use tokio::sync::mpsc;
use tracing::debug;

use crate::session::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    Root,
    Login,
    Register,
    Dashboard,
    Preferences,
}

impl AppRoute {
    /// Unknown paths resolve to [`AppRoute::Root`], which always lands on login.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let path_before_query = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path_before_query.trim().trim_end_matches('/');
        match trimmed {
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/dashboard" => Self::Dashboard,
            "/preferences" => Self::Preferences,
            _ => Self::Root,
        }
    }

    #[must_use]
    pub fn to_path(self) -> &'static str {
        match self {
            Self::Root => "/",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::Preferences => "/preferences",
        }
    }

    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard | Self::Preferences)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Admitted(AppRoute),
    Redirected { to: AppRoute },
}

impl GuardDecision {
    /// Route that ends up rendered.
    #[must_use]
    pub fn destination(self) -> AppRoute {
        match self {
            Self::Admitted(route) => route,
            Self::Redirected { to } => to,
        }
    }
}

/// Admission check run on every entry into a view. Decisions are never
/// cached: each call reads the session as it is at that moment.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    store: SessionStore,
}

impl RouteGuard {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn evaluate(&self, route: AppRoute) -> GuardDecision {
        let decision = match route {
            AppRoute::Root => GuardDecision::Redirected {
                to: AppRoute::Login,
            },
            route if route.is_protected() && !self.store.is_authenticated() => {
                GuardDecision::Redirected {
                    to: AppRoute::Login,
                }
            }
            route => GuardDecision::Admitted(route),
        };
        debug!(route = route.to_path(), ?decision, "route guard evaluated");
        decision
    }

    #[must_use]
    pub fn evaluate_path(&self, path: &str) -> GuardDecision {
        self.evaluate(AppRoute::from_path(path))
    }
}

/// Sink for navigation requests issued by views.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: AppRoute);
}

/// [`Navigator`] that forwards routes to the embedding shell over a channel.
#[derive(Debug, Clone)]
pub struct NavigationQueue {
    sender: mpsc::UnboundedSender<AppRoute>,
}

impl NavigationQueue {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AppRoute>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Navigator for NavigationQueue {
    fn navigate(&self, route: AppRoute) {
        if self.sender.send(route).is_err() {
            debug!(route = route.to_path(), "navigation dropped; shell is gone");
        }
    }
}
