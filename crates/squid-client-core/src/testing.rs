use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::SquidApi;
use crate::error::ApiError;
use crate::model::{
    ActivitiesResponse, ActivityRecord, Credentials, LoginResponse, PageVisitRecord,
    PageVisitRequest, PaginationState, Preferences, SessionInfoResponse,
};

type Scripted<T> = (Duration, Result<T, ApiError>);

/// Scripted in-memory backend. Each paged endpoint may delay its reply so
/// tests running on a paused clock can force out-of-order completion.
pub(crate) struct FakeApi {
    inner: Mutex<FakeApiState>,
}

struct FakeApiState {
    login: Scripted<LoginResponse>,
    logout: Result<(), ApiError>,
    register: Result<(), ApiError>,
    page_visit: Result<(), ApiError>,
    save_preferences: Scripted<()>,
    activities: HashMap<u32, Scripted<ActivitiesResponse>>,
    sessions: HashMap<u32, Scripted<SessionInfoResponse>>,
    calls: Vec<String>,
    saved_preferences: Vec<Preferences>,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(FakeApiState {
                login: (
                    Duration::ZERO,
                    Ok(LoginResponse {
                        message: Some("Login successful".to_string()),
                        preferences: Preferences::default(),
                    }),
                ),
                logout: Ok(()),
                register: Ok(()),
                page_visit: Ok(()),
                save_preferences: (Duration::ZERO, Ok(())),
                activities: HashMap::new(),
                sessions: HashMap::new(),
                calls: Vec::new(),
                saved_preferences: Vec::new(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, FakeApiState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn set_login(&self, result: Result<LoginResponse, ApiError>) {
        self.state().login.1 = result;
    }

    pub(crate) fn delay_login(&self, delay: Duration) {
        self.state().login.0 = delay;
    }

    pub(crate) fn set_logout(&self, result: Result<(), ApiError>) {
        self.state().logout = result;
    }

    pub(crate) fn set_register(&self, result: Result<(), ApiError>) {
        self.state().register = result;
    }

    pub(crate) fn set_page_visit(&self, result: Result<(), ApiError>) {
        self.state().page_visit = result;
    }

    pub(crate) fn set_save_preferences(&self, result: Result<(), ApiError>) {
        self.state().save_preferences.1 = result;
    }

    pub(crate) fn delay_save_preferences(&self, delay: Duration) {
        self.state().save_preferences.0 = delay;
    }

    pub(crate) fn script_activities(
        &self,
        page: u32,
        delay: Duration,
        result: Result<ActivitiesResponse, ApiError>,
    ) {
        self.state().activities.insert(page, (delay, result));
    }

    pub(crate) fn script_session(
        &self,
        page: u32,
        delay: Duration,
        result: Result<SessionInfoResponse, ApiError>,
    ) {
        self.state().sessions.insert(page, (delay, result));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub(crate) fn saved_preferences(&self) -> Vec<Preferences> {
        self.state().saved_preferences.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state().calls.push(call.into());
    }
}

fn unscripted<T>(endpoint: &str, page: u32) -> Scripted<T> {
    (
        Duration::ZERO,
        Err(ApiError::Http {
            status: 404,
            error: Some(format!("no scripted {endpoint} page {page}")),
        }),
    )
}

#[async_trait]
impl SquidApi for FakeApi {
    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.record(format!("register:{}", credentials.email));
        self.state().register.clone()
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.record(format!("login:{}", credentials.email));
        let (delay, result) = self.state().login.clone();
        tokio::time::sleep(delay).await;
        result
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("logout");
        self.state().logout.clone()
    }

    async fn session_info(&self, page: u32) -> Result<SessionInfoResponse, ApiError> {
        self.record(format!("session:{page}"));
        let (delay, result) = self
            .state()
            .sessions
            .get(&page)
            .cloned()
            .unwrap_or_else(|| unscripted("session", page));
        tokio::time::sleep(delay).await;
        result
    }

    async fn log_page_visit(&self, request: &PageVisitRequest) -> Result<(), ApiError> {
        self.record(format!("page_visit:{}", request.page));
        self.state().page_visit.clone()
    }

    async fn activities(&self, page: u32) -> Result<ActivitiesResponse, ApiError> {
        self.record(format!("activities:{page}"));
        let (delay, result) = self
            .state()
            .activities
            .get(&page)
            .cloned()
            .unwrap_or_else(|| unscripted("activities", page));
        tokio::time::sleep(delay).await;
        result
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<(), ApiError> {
        self.record("save_preferences");
        let (delay, result) = self.state().save_preferences.clone();
        tokio::time::sleep(delay).await;
        if result.is_ok() {
            self.state().saved_preferences.push(preferences.clone());
        }
        result
    }
}

pub(crate) fn pagination(current_page: u32, total_pages: u32, total_items: u64) -> PaginationState {
    PaginationState {
        current_page,
        per_page: 10,
        total_pages,
        total_items,
    }
}

pub(crate) fn activities_page(page: u32, total_pages: u32, actions: &[&str]) -> ActivitiesResponse {
    let timestamp = Utc
        .with_ymd_and_hms(2024, 3, 5, 14, 0, 0)
        .single()
        .unwrap_or_default();
    ActivitiesResponse {
        activities: actions
            .iter()
            .map(|action| ActivityRecord {
                action: (*action).to_string(),
                timestamp,
                details: None,
            })
            .collect(),
        pagination: pagination(page, total_pages, u64::from(total_pages) * 10),
    }
}

pub(crate) fn session_page(
    page: u32,
    total_pages: u32,
    duration_seconds: u64,
    visited: &[&str],
) -> SessionInfoResponse {
    let timestamp = Utc
        .with_ymd_and_hms(2024, 3, 5, 14, 0, 0)
        .single()
        .unwrap_or_default();
    SessionInfoResponse {
        start_time: Some("2024-03-05T14:00:00".to_string()),
        duration_seconds,
        pages_visited: visited
            .iter()
            .map(|page| PageVisitRecord {
                page: (*page).to_string(),
                timestamp,
            })
            .collect(),
        pagination: pagination(page, total_pages, u64::from(total_pages) * 10),
    }
}
