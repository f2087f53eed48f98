use std::sync::Arc;

use futures::FutureExt;

use crate::dedup::RequestDeduplicator;
use crate::types::RequestConfig;

use super::{Middleware, Next, StageFuture};

pub struct DedupStage {
    dedup: Arc<RequestDeduplicator>,
}

impl DedupStage {
    pub fn new(dedup: Arc<RequestDeduplicator>) -> Self {
        Self { dedup }
    }
}

impl Middleware for DedupStage {
    fn name(&self) -> &'static str {
        "dedup"
    }

    fn handle(&self, request: RequestConfig, next: Next) -> StageFuture {
        let Some(key) = request.key() else {
            return next.run(request);
        };
        let dedup = Arc::clone(&self.dedup);
        async move { dedup.dedupe(key, move || next.run(request)).await }.boxed()
    }
}
