use std::sync::Arc;

use futures::FutureExt;
use tracing::debug;

use crate::telemetry::refresh::RefreshTrigger;
use crate::token::{RefreshCoordinator, RefreshPolicy, TokenStore};
use crate::types::RequestConfig;

use super::{Middleware, Next, StageFuture};

/// Attaches the current access token, refreshing first when it is about to expire.
pub struct AuthStage {
    store: Arc<TokenStore>,
    refresh: Arc<RefreshCoordinator>,
    policy: RefreshPolicy,
}

impl AuthStage {
    pub fn new(
        store: Arc<TokenStore>,
        refresh: Arc<RefreshCoordinator>,
        policy: RefreshPolicy,
    ) -> Self {
        Self {
            store,
            refresh,
            policy,
        }
    }
}

impl Middleware for AuthStage {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn handle(&self, mut request: RequestConfig, next: Next) -> StageFuture {
        let store = Arc::clone(&self.store);
        let refresh = Arc::clone(&self.refresh);
        let policy = self.policy.clone();
        async move {
            if policy.proactive
                && store.refresh_token().await.is_some()
                && store.is_access_token_expiring_soon(policy.threshold).await
            {
                debug!(url = %request.url, "auth.proactive_refresh");
                refresh.refresh(RefreshTrigger::ExpiringSoon).await?;
            }
            request.bearer = store.access_token().await;
            request.sent_bearer.record(request.bearer.clone());
            next.run(request).await
        }
        .boxed()
    }
}
