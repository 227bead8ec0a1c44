use thiserror::Error;

/// Transport-level failure reported by a [`crate::api::SquidApi`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("squid_request_failed:{message}")]
    Network { message: String },
    #[error("squid_http_{status}:{}", .error.as_deref().unwrap_or("<none>"))]
    Http { status: u16, error: Option<String> },
    #[error("squid_json_decode_failed:{message}")]
    Decode { message: String },
    #[error("squid_invalid_path")]
    InvalidPath,
}

/// Failures surfaced at an operation boundary (login, logout, fetch, submit).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("authentication rejected: {message}")]
    AuthRejected { message: String },
    #[error("network failure: {message}")]
    NetworkFailure { message: String },
    #[error("server error (status {status:?}): {}", .message.as_deref().unwrap_or("<none>"))]
    ServerError {
        status: Option<u16>,
        message: Option<String>,
    },
}

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Maps a login transport failure: 400/401 responses mean the backend
    /// declined the credentials.
    #[must_use]
    pub fn from_login(error: ApiError) -> Self {
        match error {
            ApiError::Http {
                status: 400 | 401,
                error,
            } => Self::AuthRejected {
                message: error.unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string()),
            },
            other => Self::from(other),
        }
    }

    /// Text shown inline next to the triggering control. Client-side and
    /// server-supplied messages are shown verbatim; anything else falls back
    /// to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation { message } | Self::AuthRejected { message } => message.clone(),
            Self::ServerError {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::ServerError { .. } | Self::NetworkFailure { .. } => fallback.to_string(),
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Network { message } => Self::NetworkFailure { message },
            ApiError::Http { status, error } => Self::ServerError {
                status: Some(status),
                message: error,
            },
            // Decoder text is not meant for users; the transport logs it.
            ApiError::Decode { .. } => Self::ServerError {
                status: None,
                message: None,
            },
            ApiError::InvalidPath => Self::NetworkFailure {
                message: ApiError::InvalidPath.to_string(),
            },
        }
    }
}
