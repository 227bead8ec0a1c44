//! reqwest-backed [`SquidApi`] for the Squid REST backend.
//!
//! The backend authenticates with a server-managed session cookie, so every
//! client keeps its own cookie jar. Requests are sent once; failures are
//! reported to the caller, never retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use squid_client_core::config::{
    ClientConfig, ConfigError, DEFAULT_REQUEST_TIMEOUT_MS, MIN_REQUEST_TIMEOUT_MS,
    normalize_base_url,
};
use squid_client_core::{
    ActivitiesResponse, ApiError, Credentials, LoginResponse, PageVisitRequest, Preferences,
    SessionInfoResponse, SquidApi,
};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SquidApiClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl SquidApiClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl From<&ClientConfig> for SquidApiClientConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout_ms: u64::try_from(config.request_timeout.as_millis())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Error)]
pub enum SquidClientBuildError {
    #[error(transparent)]
    BaseUrl(#[from] ConfigError),
    #[error("squid_http_client_build_failed:{message}")]
    HttpClient { message: String },
}

#[derive(Debug, Clone)]
pub struct SquidApiClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
}

/// Error body shape used by every backend endpoint.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl SquidApiClient {
    pub fn new(config: SquidApiClientConfig) -> Result<Self, SquidClientBuildError> {
        let base_url = normalize_base_url(&config.base_url)?;
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|error| SquidClientBuildError::HttpClient {
                message: error.to_string(),
            })?;
        Ok(Self {
            base_url,
            timeout: Duration::from_millis(config.timeout_ms.max(MIN_REQUEST_TIMEOUT_MS)),
            http,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, SquidClientBuildError> {
        Self::new(SquidApiClientConfig::from(config))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn endpoint(&self, path: &str) -> Option<String> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('/') {
            Some(format!("{}{}", self.base_url, trimmed))
        } else {
            Some(format!("{}/{}", self.base_url, trimmed))
        }
    }

    #[must_use]
    pub fn register_path() -> &'static str {
        "/api/register"
    }

    #[must_use]
    pub fn login_path() -> &'static str {
        "/api/login"
    }

    #[must_use]
    pub fn logout_path() -> &'static str {
        "/api/logout"
    }

    #[must_use]
    pub fn session_path(page: u32) -> String {
        format!("/api/session?page={page}")
    }

    #[must_use]
    pub fn page_visit_path() -> &'static str {
        "/api/session/page"
    }

    #[must_use]
    pub fn activities_path(page: u32) -> String {
        format!("/api/activities?page={page}")
    }

    #[must_use]
    pub fn preferences_path() -> &'static str {
        "/api/preferences"
    }

    pub async fn get_json<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        decode_json_response(response).await
    }

    pub async fn post_json<Req, Res>(&self, path: &str, payload: &Req) -> Result<Res, ApiError>
    where
        Req: Serialize + ?Sized,
        Res: for<'de> Deserialize<'de>,
    {
        let response = self.send(Method::POST, path, Some(payload)).await?;
        decode_json_response(response).await
    }

    /// POST whose success body carries nothing the caller needs.
    pub async fn post_ack<Req>(&self, path: &str, payload: Option<&Req>) -> Result<(), ApiError>
    where
        Req: Serialize + ?Sized,
    {
        let response = self.send(Method::POST, path, payload).await?;
        expect_success(response).await
    }

    async fn send<Req>(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Req>,
    ) -> Result<reqwest::Response, ApiError>
    where
        Req: Serialize + ?Sized,
    {
        let url = self.endpoint(path).ok_or(ApiError::InvalidPath)?;
        let request_id = format!("req_{}", Uuid::new_v4().simple());
        let mut request = self
            .http
            .request(method.clone(), url.as_str())
            .header("x-request-id", request_id.as_str())
            .timeout(self.timeout);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        debug!(%method, path, request_id = %request_id, "squid request");
        request.send().await.map_err(|error| {
            warn!(%method, path, request_id = %request_id, %error, "squid request failed");
            ApiError::Network {
                message: error.to_string(),
            }
        })
    }
}

#[async_trait]
impl SquidApi for SquidApiClient {
    async fn register(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.post_ack(Self::register_path(), Some(credentials))
            .await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError> {
        self.post_json(Self::login_path(), credentials).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.post_ack(Self::logout_path(), None::<&()>).await
    }

    async fn session_info(&self, page: u32) -> Result<SessionInfoResponse, ApiError> {
        self.get_json(Self::session_path(page).as_str()).await
    }

    async fn log_page_visit(&self, request: &PageVisitRequest) -> Result<(), ApiError> {
        self.post_ack(Self::page_visit_path(), Some(request)).await
    }

    async fn activities(&self, page: u32) -> Result<ActivitiesResponse, ApiError> {
        self.get_json(Self::activities_path(page).as_str()).await
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<(), ApiError> {
        self.post_ack(Self::preferences_path(), Some(preferences))
            .await
    }
}

/// Maps a non-2xx response to [`ApiError::Http`], keeping the `error` field
/// of a `{ "error": ... }` body when there is one.
pub fn format_http_error(status: StatusCode, body: &[u8]) -> ApiError {
    let error = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .and_then(non_empty_string);
    ApiError::Http {
        status: status.as_u16(),
        error,
    }
}

async fn read_body(response: reqwest::Response) -> Result<(StatusCode, Vec<u8>), ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(|error| ApiError::Network {
        message: error.to_string(),
    })?;
    Ok((status, bytes.to_vec()))
}

async fn decode_json_response<T>(response: reqwest::Response) -> Result<T, ApiError>
where
    T: for<'de> Deserialize<'de>,
{
    let (status, bytes) = read_body(response).await?;
    if !status.is_success() {
        return Err(format_http_error(status, &bytes));
    }
    serde_json::from_slice::<T>(&bytes).map_err(|error| {
        warn!(%status, %error, "squid response did not decode");
        ApiError::Decode {
            message: error.to_string(),
        }
    })
}

/// The status line decides the outcome. A body that breaks off after the
/// status arrived still counts as a completed request, only without a
/// server message.
async fn expect_success(response: reqwest::Response) -> Result<(), ApiError> {
    let status = response.status();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes.to_vec(),
        Err(error) => {
            warn!(%status, %error, "squid response body was cut short");
            Vec::new()
        }
    };
    if status.is_success() {
        Ok(())
    } else {
        Err(format_http_error(status, &bytes))
    }
}

fn non_empty_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_builder_normalizes_paths() {
        let client = SquidApiClient::new(SquidApiClientConfig::new("https://squid.example.com/"))
            .expect("squid client");

        assert_eq!(
            client.endpoint("/api/login"),
            Some("https://squid.example.com/api/login".to_string())
        );
        assert_eq!(
            client.endpoint("api/login"),
            Some("https://squid.example.com/api/login".to_string())
        );
        assert_eq!(client.endpoint("  "), None);
    }

    #[test]
    fn path_helpers_are_deterministic() {
        assert_eq!(SquidApiClient::session_path(3), "/api/session?page=3");
        assert_eq!(SquidApiClient::activities_path(1), "/api/activities?page=1");
        assert_eq!(SquidApiClient::page_visit_path(), "/api/session/page");
        assert_eq!(SquidApiClient::preferences_path(), "/api/preferences");
        assert_eq!(SquidApiClient::logout_path(), "/api/logout");
    }

    #[test]
    fn http_error_keeps_server_message() {
        let error = format_http_error(StatusCode::BAD_REQUEST, br#"{"error":"Email already exists"}"#);
        assert_eq!(
            error,
            ApiError::Http {
                status: 400,
                error: Some("Email already exists".to_string())
            }
        );
        assert_eq!(error.to_string(), "squid_http_400:Email already exists");
    }

    #[test]
    fn http_error_without_json_body_has_no_message() {
        for body in [&b"<html>bad gateway</html>"[..], b"", br#"{"error":"  "}"#] {
            assert_eq!(
                format_http_error(StatusCode::BAD_GATEWAY, body),
                ApiError::Http {
                    status: 502,
                    error: None
                }
            );
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = SquidApiClient::new(SquidApiClientConfig::new("   "));
        assert!(matches!(
            result,
            Err(SquidClientBuildError::BaseUrl(ConfigError::EmptyBaseUrl))
        ));

        let result = SquidApiClient::new(SquidApiClientConfig::new("localhost:5000"));
        assert!(matches!(
            result,
            Err(SquidClientBuildError::BaseUrl(ConfigError::InvalidBaseUrl))
        ));
    }

    #[test]
    fn timeout_has_a_floor_and_follows_client_config() {
        let mut config = SquidApiClientConfig::new("http://localhost:5000");
        config.timeout_ms = 10;
        let client = SquidApiClient::new(config).expect("squid client");
        assert_eq!(client.timeout(), Duration::from_millis(MIN_REQUEST_TIMEOUT_MS));

        let client = SquidApiClient::from_config(&ClientConfig::default()).expect("squid client");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.timeout(),
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
        );
    }
}
