use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::warn;

use crate::errors::Error;
use crate::session::SessionHandler;
use crate::telemetry::refresh::{RefreshTelemetry, RefreshTrigger};
use crate::types::{RefreshRequest, TokenPair};

use super::TokenStore;

/// Resolves to the new access token, or `None` when there was no refresh token to
/// exchange.
type RefreshFuture = Shared<BoxFuture<'static, Result<Option<String>, Error>>>;

struct InFlight {
    telemetry: RefreshTelemetry,
    future: RefreshFuture,
}

/// Ensures at most one refresh exchange is outstanding; concurrent callers await
/// the same result.
pub struct RefreshCoordinator {
    http: Client,
    endpoint: String,
    timeout: Duration,
    login_route: String,
    store: Arc<TokenStore>,
    session: Arc<dyn SessionHandler>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
}

impl RefreshCoordinator {
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        timeout: Duration,
        login_route: impl Into<String>,
        store: Arc<TokenStore>,
        session: Arc<dyn SessionHandler>,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            timeout,
            login_route: login_route.into(),
            store,
            session,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn is_refreshing(&self) -> bool {
        self.in_flight.lock().await.is_some()
    }

    /// Joins the outstanding refresh or starts one.
    ///
    /// On failure the tokens are cleared and the session handler is told to send
    /// the user to the login route before the error is returned. A new pair that
    /// cannot be written to the token file still counts as success, since the
    /// store keeps it in memory.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Result<Option<String>, Error> {
        let future = {
            let mut slot = self.in_flight.lock().await;
            match slot.as_ref() {
                Some(in_flight) => {
                    in_flight.telemetry.emit_join();
                    in_flight.future.clone()
                }
                None => {
                    let telemetry = RefreshTelemetry::new(trigger);
                    let future = self.exchange(telemetry.clone()).shared();
                    *slot = Some(InFlight {
                        telemetry,
                        future: future.clone(),
                    });
                    future
                }
            }
        };
        future.await
    }

    fn exchange(
        &self,
        telemetry: RefreshTelemetry,
    ) -> BoxFuture<'static, Result<Option<String>, Error>> {
        let http = self.http.clone();
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;
        let login_route = self.login_route.clone();
        let store = Arc::clone(&self.store);
        let session = Arc::clone(&self.session);
        let in_flight = Arc::clone(&self.in_flight);
        async move {
            let result = match store.refresh_token().await {
                Some(refresh_token) => {
                    telemetry.emit_start(SystemTime::now());
                    request_token_pair(&http, &endpoint, timeout, &refresh_token)
                        .await
                        .map(Some)
                }
                None => Ok(None),
            };

            let result = match result {
                Ok(Some(pair)) => {
                    if let Err(err) = store
                        .set_tokens(pair.access_token.clone(), pair.refresh_token)
                        .await
                    {
                        warn!(error = %err, "refresh.persist_failed");
                    }
                    telemetry.emit_success(SystemTime::now());
                    Ok(Some(pair.access_token))
                }
                Ok(None) => Ok(None),
                Err(err) => {
                    telemetry.emit_failure(&err, SystemTime::now());
                    if let Err(clear_err) = store.clear_tokens().await {
                        warn!(error = %clear_err, "token.clear_failed");
                    }
                    session.session_expired(&login_route);
                    Err(err)
                }
            };

            in_flight.lock().await.take();
            result
        }
        .boxed()
    }
}

async fn request_token_pair(
    http: &Client,
    endpoint: &str,
    timeout: Duration,
    refresh_token: &str,
) -> Result<TokenPair, Error> {
    let response = http
        .post(endpoint)
        .timeout(timeout)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await
        .map_err(|e| Error::RefreshFailure(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = %status, "refresh endpoint rejected the refresh token");
        return Err(Error::RefreshFailure(format!(
            "refresh endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenPair>()
        .await
        .map_err(|e| Error::RefreshFailure(format!("malformed refresh response: {e}")))
}
