//! Dashboard list views.
//!
//! Each view owns its own [`PaginatedFetcher`]; the two never share a cursor
//! or ordering. Dropping a view detaches its fetcher so late responses land
//! nowhere.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use crate::api::SquidApi;
use crate::error::ClientError;
use crate::model::{
    ActivitiesResponse, PageVisitRecord, PageVisitRequest, PaginationControls, Preferences,
    SessionInfoResponse, format_duration,
};
use crate::pagination::{
    ActivitiesSource, PageRequestError, PageRequestOutcome, PageSnapshot, PaginatedFetcher,
    VisitedPagesSource,
};
use crate::routing::{AppRoute, Navigator};
use crate::session::SessionStore;

pub const ACTIVITY_LOAD_ERROR: &str = "Failed to load activities";
pub const SESSION_LOAD_ERROR: &str = "Error fetching session data";
pub const DASHBOARD_PAGE: &str = "dashboard";

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub action: String,
    pub timestamp: DateTime<Utc>,
    /// Compact JSON rendering of the record's details.
    pub details: Option<String>,
}

pub struct ActivityLogView {
    fetcher: PaginatedFetcher<ActivitiesSource>,
}

impl ActivityLogView {
    pub fn new(api: Arc<dyn SquidApi>) -> Self {
        Self {
            fetcher: PaginatedFetcher::new(ActivitiesSource::new(api)),
        }
    }

    pub async fn open(&self) -> Result<PageRequestOutcome, PageRequestError> {
        self.fetcher.request_page(1).await
    }

    pub async fn select_page(&self, page: u32) -> Result<PageRequestOutcome, PageRequestError> {
        self.fetcher.request_page(page).await
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.fetcher.snapshot().is_loading()
    }

    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.fetcher
            .snapshot()
            .items()
            .iter()
            .map(|record| ActivityEntry {
                action: record.action.clone(),
                timestamp: record.timestamp,
                details: record
                    .details
                    .as_ref()
                    .and_then(|details| serde_json::to_string(details).ok()),
            })
            .collect()
    }

    #[must_use]
    pub fn controls(&self) -> PaginationControls {
        self.fetcher.snapshot().pagination().controls()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&'static str> {
        self.fetcher
            .snapshot()
            .last_error()
            .map(|_| ACTIVITY_LOAD_ERROR)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PageSnapshot<ActivitiesResponse>> {
        self.fetcher.subscribe()
    }
}

impl Drop for ActivityLogView {
    fn drop(&mut self) {
        self.fetcher.detach();
    }
}

/// The "current session" panel of the dashboard: duration, cached
/// preferences and the paginated list of visited pages.
pub struct SessionView {
    api: Arc<dyn SquidApi>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    fetcher: PaginatedFetcher<VisitedPagesSource>,
}

impl SessionView {
    pub fn new(api: Arc<dyn SquidApi>, store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            fetcher: PaginatedFetcher::new(VisitedPagesSource::new(Arc::clone(&api))),
            api,
            store,
            navigator,
        }
    }

    pub async fn open(&self) -> Result<PageRequestOutcome, PageRequestError> {
        self.visit(1).await
    }

    pub async fn select_page(&self, page: u32) -> Result<PageRequestOutcome, PageRequestError> {
        self.visit(page).await
    }

    /// Every page shown counts as a dashboard visit. The visit is recorded
    /// alongside the fetch; a failed record is logged only and never blocks
    /// the page load. Rejected pages and detached views record nothing.
    async fn visit(&self, page: u32) -> Result<PageRequestOutcome, PageRequestError> {
        let reachable = self.fetcher.snapshot().pagination().contains(page);
        if !reachable || self.fetcher.is_detached() {
            return self.fetcher.request_page(page).await;
        }

        let visit = PageVisitRequest {
            page: DASHBOARD_PAGE.to_string(),
        };
        let (logged, loaded) = tokio::join!(
            self.api.log_page_visit(&visit),
            self.fetcher.request_page(page)
        );
        if let Err(error) = logged {
            warn!(%error, page = DASHBOARD_PAGE, "logging page visit failed");
        }
        loaded
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.fetcher.snapshot().is_loading()
    }

    #[must_use]
    pub fn duration_label(&self) -> Option<String> {
        self.fetcher
            .snapshot()
            .page()
            .map(|info| format_duration(info.duration_seconds))
    }

    #[must_use]
    pub fn preferences(&self) -> Preferences {
        self.store.preferences().unwrap_or_default()
    }

    #[must_use]
    pub fn visits(&self) -> Vec<PageVisitRecord> {
        self.fetcher.snapshot().items().to_vec()
    }

    /// Controls are only offered when there is more than one page.
    #[must_use]
    pub fn controls(&self) -> Option<PaginationControls> {
        let pagination = self.fetcher.snapshot().pagination();
        (pagination.total_pages > 1).then(|| pagination.controls())
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&'static str> {
        self.fetcher
            .snapshot()
            .last_error()
            .map(|_| SESSION_LOAD_ERROR)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PageSnapshot<SessionInfoResponse>> {
        self.fetcher.subscribe()
    }

    /// Logs out and leaves the dashboard. The login view is shown even when
    /// the logout request could not complete.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.store.logout().await;
        self.fetcher.detach();
        self.navigator.navigate(AppRoute::Login);
        result
    }
}

impl Drop for SessionView {
    fn drop(&mut self) {
        self.fetcher.detach();
    }
}

/// Both dashboard panels, loaded side by side.
pub struct DashboardView {
    pub session: SessionView,
    pub activity: ActivityLogView,
}

impl DashboardView {
    pub fn new(api: Arc<dyn SquidApi>, store: SessionStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            activity: ActivityLogView::new(Arc::clone(&api)),
            session: SessionView::new(api, store, navigator),
        }
    }

    /// Opens both panels. Each result is independent of the other.
    pub async fn open(
        &self,
    ) -> (
        Result<PageRequestOutcome, PageRequestError>,
        Result<PageRequestOutcome, PageRequestError>,
    ) {
        tokio::join!(self.session.open(), self.activity.open())
    }
}
