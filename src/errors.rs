use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Error body surfaced to callers.
///
/// The API nests this under an `error` key; when it doesn't (or the request never
/// reached the server) one is synthesized from the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub request_id: String,
}

impl ApiError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: jiff::Timestamp::now().to_string(),
            request_id: request_id.into(),
        }
    }

    /// Fills in the fields a server body may leave out.
    pub(crate) fn complete(mut self, request_id: &str) -> Self {
        if self.timestamp.is_empty() {
            self.timestamp = jiff::Timestamp::now().to_string();
        }
        if self.request_id.is_empty() {
            self.request_id = request_id.to_string();
        }
        self
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("HTTP {}: {}", .0, .1.message)]
    Http(StatusCode, ApiError),
    #[error("token refresh failed: {0}")]
    RefreshFailure(String),
    #[error("invalid JSON: {0}")]
    Json(Arc<serde_json::Error>),
    #[error("I/O error: {0}")]
    Io(Arc<std::io::Error>),
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(status, _) => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Connection failures, timeouts and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) | Error::Timeout(_) => true,
            Error::Http(status, _) => status.is_server_error(),
            _ => false,
        }
    }

    /// The standard error shape for this failure.
    pub fn to_api_error(&self) -> ApiError {
        match self {
            Error::Http(_, body) => body.clone(),
            Error::Network(_) | Error::Timeout(_) => {
                ApiError::new("NETWORK_ERROR", self.to_string(), "unknown")
            }
            Error::RefreshFailure(_) => {
                ApiError::new("REFRESH_FAILURE", self.to_string(), "unknown")
            }
            Error::Json(_) => ApiError::new("INVALID_RESPONSE", self.to_string(), "unknown"),
            Error::Io(_) => ApiError::new("IO_ERROR", self.to_string(), "unknown"),
            Error::Config(_) => ApiError::new("CONFIG_ERROR", self.to_string(), "unknown"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}
