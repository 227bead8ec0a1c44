use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 250;
pub const DEFAULT_REDIRECT_DELAY_MS: u64 = 1_500;
pub const DEFAULT_LOG_FILTER: &str = "info";

pub const ENV_API_BASE_URL: &str = "SQUID_API_BASE_URL";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SQUID_REQUEST_TIMEOUT_MS";
pub const ENV_REDIRECT_DELAY_MS: &str = "SQUID_REDIRECT_DELAY_MS";
pub const ENV_LOG_FILTER: &str = "SQUID_LOG_FILTER";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("base url must not be empty")]
    EmptyBaseUrl,
    #[error("base url must use http:// or https:// and include a host")]
    InvalidBaseUrl,
    #[error("invalid {key} value '{value}': expected a non-negative integer")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub redirect_delay: Duration,
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            redirect_delay: Duration::from_millis(DEFAULT_REDIRECT_DELAY_MS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = env_non_empty(ENV_API_BASE_URL)
            .map(|value| normalize_base_url(&value))
            .transpose()?
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let request_timeout_ms = env_u64(ENV_REQUEST_TIMEOUT_MS)?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
            .max(MIN_REQUEST_TIMEOUT_MS);

        let redirect_delay_ms =
            env_u64(ENV_REDIRECT_DELAY_MS)?.unwrap_or(DEFAULT_REDIRECT_DELAY_MS);

        let log_filter =
            env_non_empty(ENV_LOG_FILTER).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_millis(request_timeout_ms),
            redirect_delay: Duration::from_millis(redirect_delay_ms),
            log_filter,
        })
    }
}

pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl);
    }
    let Some((_, remainder)) = trimmed.split_once("://") else {
        return Err(ConfigError::InvalidBaseUrl);
    };
    if remainder.trim().is_empty() || remainder.starts_with('/') {
        return Err(ConfigError::InvalidBaseUrl);
    }
    Ok(trimmed.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u64(key: &'static str) -> Result<Option<u64>, ConfigError> {
    env_non_empty(key)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { key, value })
        })
        .transpose()
}
