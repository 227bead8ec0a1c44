use async_trait::async_trait;

use crate::error::ApiError;
use crate::model::{
    ActivitiesResponse, Credentials, LoginResponse, PageVisitRequest, Preferences,
    SessionInfoResponse,
};

/// REST contract of the Squid backend.
///
/// Implementations carry the session cookie established by `login` on every
/// later call; nothing in this trait passes tokens explicitly.
#[async_trait]
pub trait SquidApi: Send + Sync {
    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError>;
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn session_info(&self, page: u32) -> Result<SessionInfoResponse, ApiError>;
    async fn log_page_visit(&self, request: &PageVisitRequest) -> Result<(), ApiError>;
    async fn activities(&self, page: u32) -> Result<ActivitiesResponse, ApiError>;
    async fn save_preferences(&self, preferences: &Preferences) -> Result<(), ApiError>;
}
