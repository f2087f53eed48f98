//! Ordered middleware chain every request travels through.
//!
//! Stages run outermost first: cache, dedup, refresh, retry, auth, then the
//! transport. Each stage sees the request on the way in and the result on the way
//! out, and may answer without calling further in.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::errors::Error;
use crate::transport::HttpTransport;
use crate::types::RequestConfig;

mod auth;
mod cache;
mod dedup;
mod refresh;
mod retry;

pub use auth::AuthStage;
pub use cache::CacheStage;
pub use dedup::DedupStage;
pub use refresh::RefreshStage;
pub use retry::RetryStage;

pub type StageFuture = BoxFuture<'static, Result<Value, Error>>;

pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    fn handle(&self, request: RequestConfig, next: Next) -> StageFuture;
}

/// The remainder of the chain after the current stage.
#[derive(Clone)]
pub struct Next {
    stages: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    transport: Arc<HttpTransport>,
}

impl Next {
    pub fn run(&self, request: RequestConfig) -> StageFuture {
        match self.stages.get(self.index) {
            Some(stage) => {
                let next = Next {
                    stages: Arc::clone(&self.stages),
                    index: self.index + 1,
                    transport: Arc::clone(&self.transport),
                };
                stage.handle(request, next)
            }
            None => {
                let transport = Arc::clone(&self.transport);
                async move { transport.send(&request).await }.boxed()
            }
        }
    }
}

pub struct Pipeline {
    stages: Arc<[Arc<dyn Middleware>]>,
    transport: Arc<HttpTransport>,
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Middleware>>, transport: Arc<HttpTransport>) -> Self {
        Self {
            stages: stages.into(),
            transport,
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub async fn dispatch(&self, request: RequestConfig) -> Result<Value, Error> {
        Next {
            stages: Arc::clone(&self.stages),
            index: 0,
            transport: Arc::clone(&self.transport),
        }
        .run(request)
        .await
    }
}
