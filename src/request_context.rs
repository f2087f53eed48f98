use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::cache::{ResponseCache, SweeperHandle};
use crate::config::Config;
use crate::dedup::RequestDeduplicator;
use crate::errors::Error;
use crate::pipeline::{
    AuthStage, CacheStage, DedupStage, Middleware, Pipeline, RefreshStage, RetryStage,
};
use crate::retry::{RetryCoordinator, RetryPlan};
use crate::session::SessionHandler;
use crate::token::{RefreshCoordinator, RefreshPolicy, TokenStore};
use crate::transport::HttpTransport;
use crate::types::RequestConfig;

/// Shared state behind every request: tokens, cache, in-flight calls, retry and
/// refresh coordination, wired into one pipeline.
#[derive(Clone)]
pub struct RequestDispatchContext {
    transport: Arc<HttpTransport>,
    store: Arc<TokenStore>,
    cache: Arc<ResponseCache>,
    dedup: Arc<RequestDeduplicator>,
    retry: Arc<RetryCoordinator>,
    refresh: Arc<RefreshCoordinator>,
    policy: RefreshPolicy,
    pipeline: Arc<Pipeline>,
    _sweeper: Option<Arc<SweeperHandle>>,
}

impl RequestDispatchContext {
    pub fn build(config: &Config, session: Arc<dyn SessionHandler>) -> Result<Self, Error> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config.base_url, config.timeout())?);
        let store = Arc::new(TokenStore::new(config)?);
        let policy = RefreshPolicy::from_config(config)?;
        let cache = Arc::new(ResponseCache::new(config.cache_max_size, config.cache_ttl()));
        let dedup = Arc::new(RequestDeduplicator::new());
        let retry = Arc::new(RetryCoordinator::new(RetryPlan::from_config(config)));
        let refresh = Arc::new(RefreshCoordinator::new(
            transport.http_client().clone(),
            transport.url_for(&config.refresh_path),
            config.refresh_timeout(),
            config.login_route.clone(),
            Arc::clone(&store),
            session,
        ));

        // the sweeper needs a runtime; without one, expiry still happens on read
        let sweeper = match tokio::runtime::Handle::try_current() {
            Ok(_) => Some(Arc::new(ResponseCache::spawn_sweeper(
                &cache,
                config.cache_sweep_interval(),
            ))),
            Err(_) => {
                debug!("cache.sweeper_disabled");
                None
            }
        };

        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(CacheStage::new(Arc::clone(&cache))),
            Arc::new(DedupStage::new(Arc::clone(&dedup))),
            Arc::new(RefreshStage::new(Arc::clone(&store), Arc::clone(&refresh))),
            Arc::new(RetryStage::new(Arc::clone(&retry))),
            Arc::new(AuthStage::new(
                Arc::clone(&store),
                Arc::clone(&refresh),
                policy.clone(),
            )),
        ];
        let pipeline = Arc::new(Pipeline::new(stages, Arc::clone(&transport)));

        Ok(Self {
            transport,
            store,
            cache,
            dedup,
            retry,
            refresh,
            policy,
            pipeline,
            _sweeper: sweeper,
        })
    }

    pub async fn dispatch(&self, request: RequestConfig) -> Result<Value, Error> {
        self.pipeline.dispatch(request).await
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    pub fn store(&self) -> Arc<TokenStore> {
        Arc::clone(&self.store)
    }

    pub fn cache(&self) -> Arc<ResponseCache> {
        Arc::clone(&self.cache)
    }

    pub fn dedup(&self) -> Arc<RequestDeduplicator> {
        Arc::clone(&self.dedup)
    }

    pub fn retry(&self) -> Arc<RetryCoordinator> {
        Arc::clone(&self.retry)
    }

    pub fn refresh(&self) -> Arc<RefreshCoordinator> {
        Arc::clone(&self.refresh)
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}
