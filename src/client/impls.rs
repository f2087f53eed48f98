use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use crate::ApiClient;
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::errors::Error;
use crate::request_context::RequestDispatchContext;
use crate::session::{LogRedirect, SessionHandler};
use crate::telemetry::refresh::RefreshTrigger;
use crate::token::{Claims, TokenStore};
use crate::types::{RequestBody, RequestConfig, RequestOptions};
use crate::upload::{FileUpload, ProgressFn};

impl ApiClient {
    /// Create a new ApiClient
    /// # Arguments
    /// * `config` - Explicit configuration (`Config`), typically loaded via `Config::from_file` or `Config::from_env`.
    /// # ENV Vars (when using `Config::from_env`)
    /// * `JOB_BOARD_API_URL` - API base URL
    /// * `JOB_BOARD_API_TIMEOUT` - Per-request timeout in milliseconds
    /// * `JOB_BOARD_TOKEN_FILE` - Optional file the token pair is persisted to
    pub fn new(config: Config) -> Result<Self, Error> {
        Self::with_session_handler(config, Arc::new(LogRedirect))
    }

    /// Like `new`, with a custom hook for when the session cannot be refreshed.
    pub fn with_session_handler(
        config: Config,
        session: Arc<dyn SessionHandler>,
    ) -> Result<Self, Error> {
        let ctx = RequestDispatchContext::build(&config, Arc::clone(&session))?;
        info!(
            base_url = %ctx.transport().base_url(),
            environment = ?config.environment,
            "client.ready"
        );
        Ok(Self { ctx, session })
    }

    /// Sends `request` through the pipeline and decodes the response body.
    pub async fn request<T: DeserializeOwned>(&self, request: RequestConfig) -> Result<T, Error> {
        let value = self.ctx.dispatch(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(RequestConfig::get(url).with_options(options))
            .await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        data: &impl Serialize,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.send_with_body(Method::POST, url, data, options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        url: &str,
        data: &impl Serialize,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.send_with_body(Method::PUT, url, data, options).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        url: &str,
        data: &impl Serialize,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.send_with_body(Method::PATCH, url, data, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T, Error> {
        self.request(RequestConfig::new(Method::DELETE, url).with_options(options))
            .await
    }

    /// POSTs `file` as multipart form data. `on_progress` receives whole percentages
    /// as the body is streamed. Uploads bypass the cache and the deduplicator.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        url: &str,
        file: FileUpload,
        on_progress: Option<ProgressFn>,
    ) -> Result<T, Error> {
        debug!(url, file_name = %file.file_name, bytes = file.len(), "upload.start");
        let mut request = RequestConfig::new(Method::POST, url);
        request.body = Some(RequestBody::Multipart { file, on_progress });
        self.request(request).await
    }

    /// Drops cached responses whose key contains `pattern`, or all of them.
    pub async fn invalidate_cache(&self, pattern: Option<&str>) -> usize {
        self.ctx.cache().invalidate(pattern).await
    }

    pub async fn set_tokens(
        &self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<(), Error> {
        self.ctx.store().set_tokens(access_token, refresh_token).await
    }

    pub async fn clear_tokens(&self) -> Result<(), Error> {
        self.ctx.store().clear_tokens().await
    }

    pub async fn access_token(&self) -> Option<String> {
        self.ctx.store().access_token().await
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.ctx.store().refresh_token().await
    }

    /// True when the access token is missing or within the refresh threshold of
    /// expiring.
    pub async fn is_token_expiring_soon(&self) -> bool {
        self.ctx
            .store()
            .is_access_token_expiring_soon(self.ctx.policy().threshold)
            .await
    }

    pub async fn claims(&self) -> Option<Claims> {
        self.ctx.store().claims().await
    }

    /// Refreshes now, joining any refresh already running. `Ok(None)` when there is
    /// no refresh token.
    pub async fn refresh_now(&self) -> Result<Option<String>, Error> {
        self.ctx.refresh().refresh(RefreshTrigger::Explicit).await
    }

    /// True while a refresh exchange is outstanding.
    pub async fn is_refreshing(&self) -> bool {
        self.ctx.refresh().is_refreshing().await
    }

    pub async fn pending_requests(&self) -> usize {
        self.ctx.dedup().in_flight().await
    }

    pub fn cache(&self) -> Arc<ResponseCache> {
        self.ctx.cache()
    }

    pub fn token_store(&self) -> Arc<TokenStore> {
        self.ctx.store()
    }

    pub fn session_handler(&self) -> Arc<dyn SessionHandler> {
        Arc::clone(&self.session)
    }

    pub fn url_for(&self, path: &str) -> String {
        self.ctx.transport().url_for(path)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.ctx.pipeline().stage_names()
    }

    async fn send_with_body<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        data: &impl Serialize,
        options: RequestOptions,
    ) -> Result<T, Error> {
        let body: Value = serde_json::to_value(data)?;
        self.request(RequestConfig::new(method, url).json(body).with_options(options))
            .await
    }
}
