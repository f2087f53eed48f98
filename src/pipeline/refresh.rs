use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::telemetry::refresh::RefreshTrigger;
use crate::token::{RefreshCoordinator, TokenStore};
use crate::types::{RequestConfig, SentBearer};

use super::{Middleware, Next, StageFuture};

/// Recovers from a 401 by refreshing once and replaying the request once.
pub struct RefreshStage {
    store: Arc<TokenStore>,
    refresh: Arc<RefreshCoordinator>,
}

impl RefreshStage {
    pub fn new(store: Arc<TokenStore>, refresh: Arc<RefreshCoordinator>) -> Self {
        Self { store, refresh }
    }
}

impl Middleware for RefreshStage {
    fn name(&self) -> &'static str {
        "refresh"
    }

    fn handle(&self, mut request: RequestConfig, next: Next) -> StageFuture {
        let store = Arc::clone(&self.store);
        let refresh = Arc::clone(&self.refresh);
        async move {
            let sent = SentBearer::default();
            request.sent_bearer = sent.clone();
            let err = match next.run(request.clone()).await {
                Ok(data) => return Ok(data),
                Err(err) if err.is_unauthorized() && !request.auth_retried => err,
                Err(err) => return Err(err),
            };
            warn!(method = %request.method, url = %request.url, "auth.unauthorized");

            let mut replay = request;
            replay.auth_retried = true;

            // another caller rotated the token after the rejected one was attached
            let current = store.access_token().await;
            if current.is_some() && current != sent.get() {
                debug!(url = %replay.url, "auth.replay_with_rotated_token");
                return next.run(replay).await;
            }

            match refresh.refresh(RefreshTrigger::Unauthorized).await? {
                Some(_) => next.run(replay).await,
                None => Err(err),
            }
        }
        .boxed()
    }
}
