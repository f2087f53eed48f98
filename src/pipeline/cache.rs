use std::sync::Arc;

use futures::FutureExt;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::types::RequestConfig;

use super::{Middleware, Next, StageFuture};

/// Answers cacheable requests from the response cache and stores fresh successes.
pub struct CacheStage {
    cache: Arc<ResponseCache>,
}

impl CacheStage {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self { cache }
    }
}

impl Middleware for CacheStage {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn handle(&self, request: RequestConfig, next: Next) -> StageFuture {
        let key = match request.key() {
            Some(key) if request.is_cacheable() => key,
            _ => return next.run(request),
        };
        let cache = Arc::clone(&self.cache);
        async move {
            if let Some(hit) = cache.get(&key).await {
                debug!(key = %key, "cache.hit");
                return Ok(hit);
            }
            let ttl = request.cache_ttl;
            let data = next.run(request).await?;
            cache.set(key, data.clone(), ttl).await;
            Ok(data)
        }
        .boxed()
    }
}
