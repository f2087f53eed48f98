use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::request_key;
use crate::upload::{FileUpload, ProgressFn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub user: Value,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart {
        file: FileUpload,
        on_progress: Option<ProgressFn>,
    },
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
            RequestBody::Multipart { file, on_progress } => f
                .debug_struct("Multipart")
                .field("file_name", &file.file_name)
                .field("len", &file.len())
                .field("tracks_progress", &on_progress.is_some())
                .finish(),
        }
    }
}

/// Per-call options accepted by the verb helpers on `ApiClient`.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub params: BTreeMap<String, String>,
    pub cache: Option<bool>,
    pub cache_ttl: Option<Duration>,
    pub retries: Option<u8>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn retries(mut self, retries: u8) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A single call travelling through the pipeline.
#[derive(Clone, Debug)]
pub struct RequestConfig {
    pub method: Method,
    pub url: String,
    pub params: BTreeMap<String, String>,
    pub body: Option<RequestBody>,
    pub cache: Option<bool>,
    pub cache_ttl: Option<Duration>,
    pub retries: Option<u8>,
    pub timeout: Option<Duration>,
    pub(crate) bearer: Option<String>,
    pub(crate) sent_bearer: SentBearer,
    pub(crate) auth_retried: bool,
}

/// The bearer the auth stage attached on the latest attempt, visible to the
/// stages above it.
#[derive(Clone, Debug, Default)]
pub(crate) struct SentBearer(Arc<Mutex<Option<String>>>);

impl SentBearer {
    pub(crate) fn record(&self, token: Option<String>) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub(crate) fn get(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: BTreeMap::new(),
            body: None,
            cache: None,
            cache_ttl: None,
            retries: None,
            timeout: None,
            bearer: None,
            sent_bearer: SentBearer::default(),
            auth_retried: false,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.params.extend(options.params);
        self.cache = options.cache.or(self.cache);
        self.cache_ttl = options.cache_ttl.or(self.cache_ttl);
        self.retries = options.retries.or(self.retries);
        self.timeout = options.timeout.or(self.timeout);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    fn is_multipart(&self) -> bool {
        matches!(self.body, Some(RequestBody::Multipart { .. }))
    }

    /// GET is cacheable unless opted out; other methods only when opted in.
    pub fn is_cacheable(&self) -> bool {
        !self.is_multipart() && self.cache.unwrap_or(self.method == Method::GET)
    }

    /// Canonical identity shared by the cache and the deduplicator.
    /// Multipart uploads have none.
    pub fn key(&self) -> Option<String> {
        let body = match &self.body {
            Some(RequestBody::Json(value)) => Some(value),
            Some(RequestBody::Multipart { .. }) => return None,
            None => None,
        };
        Some(request_key(&self.method, &self.url, &self.params, body))
    }
}
