//! Page-by-page retrieval of a server collection.
//!
//! [`PaginatedFetcher`] applies responses in the order pages were requested,
//! not the order responses arrive: every request takes a sequence number and
//! a response is applied only if no newer request was issued meanwhile.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::SquidApi;
use crate::error::{ApiError, ClientError};
use crate::model::{
    ActivitiesResponse, ActivityRecord, PageVisitRecord, PaginationState, SessionInfoResponse,
};

/// A page of a collection shaped as `{ items, pagination }`.
pub trait Paginated {
    type Item;

    fn pagination(&self) -> PaginationState;
    fn items(&self) -> &[Self::Item];
}

impl Paginated for ActivitiesResponse {
    type Item = ActivityRecord;

    fn pagination(&self) -> PaginationState {
        self.pagination
    }

    fn items(&self) -> &[ActivityRecord] {
        &self.activities
    }
}

impl Paginated for SessionInfoResponse {
    type Item = PageVisitRecord;

    fn pagination(&self) -> PaginationState {
        self.pagination
    }

    fn items(&self) -> &[PageVisitRecord] {
        &self.pages_visited
    }
}

#[async_trait]
pub trait PageSource: Send + Sync {
    type Page: Paginated + Clone + Send + Sync + 'static;

    async fn fetch_page(&self, page: u32) -> Result<Self::Page, ApiError>;
}

/// `GET /api/activities?page=N`.
#[derive(Clone)]
pub struct ActivitiesSource {
    api: Arc<dyn SquidApi>,
}

impl ActivitiesSource {
    pub fn new(api: Arc<dyn SquidApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for ActivitiesSource {
    type Page = ActivitiesResponse;

    async fn fetch_page(&self, page: u32) -> Result<ActivitiesResponse, ApiError> {
        self.api.activities(page).await
    }
}

/// `GET /api/session?page=N`.
#[derive(Clone)]
pub struct VisitedPagesSource {
    api: Arc<dyn SquidApi>,
}

impl VisitedPagesSource {
    pub fn new(api: Arc<dyn SquidApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl PageSource for VisitedPagesSource {
    type Page = SessionInfoResponse;

    async fn fetch_page(&self, page: u32) -> Result<SessionInfoResponse, ApiError> {
        self.api.session_info(page).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageRequestError {
    #[error("page {requested} is outside 1..={total_pages}")]
    OutOfRange { requested: u32, total_pages: u32 },
    #[error(transparent)]
    Fetch(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequestOutcome {
    Applied,
    /// A newer request was issued before this response arrived.
    Superseded,
    /// The owning view was torn down before the response arrived.
    Detached,
}

#[derive(Debug, Clone)]
pub struct PageSnapshot<P> {
    page: Option<P>,
    pagination: PaginationState,
    desired_page: u32,
    loading: bool,
    last_error: Option<ClientError>,
    request_seq: u64,
    detached: bool,
}

impl<P> Default for PageSnapshot<P> {
    fn default() -> Self {
        Self {
            page: None,
            pagination: PaginationState::default(),
            desired_page: 1,
            loading: false,
            last_error: None,
            request_seq: 0,
            detached: false,
        }
    }
}

impl<P: Paginated> PageSnapshot<P> {
    /// Last successfully applied response.
    #[must_use]
    pub fn page(&self) -> Option<&P> {
        self.page.as_ref()
    }

    #[must_use]
    pub fn items(&self) -> &[P::Item] {
        match &self.page {
            Some(page) => page.items(),
            None => &[],
        }
    }

    #[must_use]
    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    #[must_use]
    pub fn desired_page(&self) -> u32 {
        self.desired_page
    }

    /// True only while the first page is being acquired.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }
}

pub struct PaginatedFetcher<S: PageSource> {
    source: S,
    state: watch::Sender<PageSnapshot<S::Page>>,
}

impl<S: PageSource> PaginatedFetcher<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(PageSnapshot::default());
        Self { source, state }
    }

    /// Requests `page`. Pages outside the last known `[1, total_pages]` are
    /// rejected without contacting the backend.
    pub async fn request_page(&self, page: u32) -> Result<PageRequestOutcome, PageRequestError> {
        let mut issued = None;
        let mut rejected = None;
        self.state.send_if_modified(|state| {
            if state.detached {
                return false;
            }
            if !state.pagination.contains(page) {
                rejected = Some(state.pagination.total_pages);
                return false;
            }
            state.request_seq += 1;
            state.desired_page = page;
            state.loading = state.page.is_none();
            issued = Some(state.request_seq);
            true
        });

        if let Some(total_pages) = rejected {
            debug!(page, total_pages, "page request outside pagination range");
            return Err(PageRequestError::OutOfRange {
                requested: page,
                total_pages,
            });
        }
        let Some(seq) = issued else {
            return Ok(PageRequestOutcome::Detached);
        };

        let result = self.source.fetch_page(page).await;
        self.apply(seq, page, result).map_err(PageRequestError::from)
    }

    fn apply(
        &self,
        seq: u64,
        page: u32,
        result: Result<S::Page, ApiError>,
    ) -> Result<PageRequestOutcome, ClientError> {
        let mut outcome = PageRequestOutcome::Applied;
        let mut failure = None;
        self.state.send_if_modified(|state| {
            if state.detached {
                outcome = PageRequestOutcome::Detached;
                return false;
            }
            if state.request_seq != seq {
                outcome = PageRequestOutcome::Superseded;
                return false;
            }
            state.loading = false;
            match result {
                Ok(response) => {
                    state.pagination = response.pagination().normalized();
                    state.page = Some(response);
                    state.last_error = None;
                }
                Err(error) => {
                    let error = ClientError::from(error);
                    state.last_error = Some(error.clone());
                    failure = Some(error);
                }
            }
            true
        });

        match (outcome, failure) {
            (PageRequestOutcome::Applied, Some(error)) => {
                warn!(page, %error, "page fetch failed; keeping previous page");
                Err(error)
            }
            (PageRequestOutcome::Superseded, _) => {
                debug!(page, seq, "discarding stale page response");
                Ok(outcome)
            }
            (PageRequestOutcome::Detached, _) => {
                debug!(page, "discarding page response for detached view");
                Ok(outcome)
            }
            (PageRequestOutcome::Applied, None) => Ok(outcome),
        }
    }

    /// Stops applying responses. Requests still in flight complete but never
    /// touch this fetcher's state.
    pub fn detach(&self) {
        self.state.send_if_modified(|state| {
            let changed = !state.detached;
            state.detached = true;
            changed
        });
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.state.borrow().detached
    }

    #[must_use]
    pub fn snapshot(&self) -> PageSnapshot<S::Page> {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PageSnapshot<S::Page>> {
        self.state.subscribe()
    }
}
