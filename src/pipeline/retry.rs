use std::sync::Arc;

use futures::FutureExt;

use crate::retry::RetryCoordinator;
use crate::types::RequestConfig;

use super::{Middleware, Next, StageFuture};

/// Re-sends transient failures with exponential backoff.
pub struct RetryStage {
    coordinator: Arc<RetryCoordinator>,
}

impl RetryStage {
    pub fn new(coordinator: Arc<RetryCoordinator>) -> Self {
        Self { coordinator }
    }
}

impl Middleware for RetryStage {
    fn name(&self) -> &'static str {
        "retry"
    }

    fn handle(&self, request: RequestConfig, next: Next) -> StageFuture {
        let coordinator = Arc::clone(&self.coordinator);
        async move {
            let budget = request.retries.unwrap_or(coordinator.plan().max_retries);
            let label = format!("{} {}", request.method, request.url);
            let method = request.method.clone();
            let (data, _outcome) = coordinator
                .execute(&label, &method, budget, |_| next.run(request.clone()))
                .await?;
            Ok(data)
        }
        .boxed()
    }
}
