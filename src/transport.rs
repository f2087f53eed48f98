use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{ApiError, Error};
use crate::types::{RequestBody, RequestConfig};
use crate::upload::multipart_form;

const USER_AGENT: &str = concat!("job-board-client-rust/", env!("CARGO_PKG_VERSION"));

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Issues one HTTP exchange for a `RequestConfig` and normalizes the outcome.
pub struct HttpTransport {
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn http_client(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; anything else is resolved against the base URL.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn send(&self, request: &RequestConfig) -> Result<Value, Error> {
        let request_id = Uuid::new_v4().to_string();
        let timeout = request.timeout.unwrap_or(self.timeout);
        let url = self.url_for(&request.url);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .timeout(timeout)
            .header("X-Request-Id", &request_id);
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        if let Some(token) = request.bearer.as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Multipart { file, on_progress }) => {
                builder.multipart(multipart_form(file, on_progress.clone())?)
            }
            None => builder,
        };

        debug!(method = %request.method, url = %url, request_id = %request_id, "http.request");
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(timeout)
            } else {
                Error::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(timeout)
            } else {
                Error::Network(e.to_string())
            }
        })?;

        if status.is_success() {
            return Ok(parse_body(&text));
        }

        warn!(
            method = %request.method,
            url = %url,
            status = status.as_u16(),
            request_id = %request_id,
            "http.error"
        );
        Err(Error::Http(status, error_body(status, &text, &request_id)))
    }
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// The server's `{"error": {...}}` body, or one synthesized from the status.
fn error_body(status: StatusCode, text: &str, request_id: &str) -> ApiError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(text) {
        return envelope.error.complete(request_id);
    }
    let message = if text.trim().is_empty() {
        status.canonical_reason().unwrap_or("Request failed").to_string()
    } else {
        text.to_string()
    };
    ApiError::new(format!("HTTP_{}", status.as_u16()), message, request_id)
}
