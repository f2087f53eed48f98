//! Coalescing of concurrent identical requests.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::Error;

type SharedResponse = Shared<BoxFuture<'static, Result<Value, Error>>>;

/// Maps a request key to its in-flight call. An entry lives exactly as long as the
/// call is unsettled.
#[derive(Default)]
pub struct RequestDeduplicator {
    pending: Arc<Mutex<HashMap<String, SharedResponse>>>,
}

impl RequestDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins the in-flight call for `key`, or starts one with `factory`.
    /// Every caller sharing a call sees the same value or error.
    pub async fn dedupe<F>(&self, key: String, factory: F) -> Result<Value, Error>
    where
        F: FnOnce() -> BoxFuture<'static, Result<Value, Error>>,
    {
        let shared = {
            let mut pending = self.pending.lock().await;
            match pending.get(&key) {
                Some(existing) => {
                    debug!(key = %key, "dedup.join");
                    existing.clone()
                }
                None => {
                    let call = factory();
                    let registry = Arc::clone(&self.pending);
                    let cleanup_key = key.clone();
                    let shared = async move {
                        let result = call.await;
                        registry.lock().await.remove(&cleanup_key);
                        result
                    }
                    .boxed()
                    .shared();
                    pending.insert(key, shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    pub async fn in_flight(&self) -> usize {
        self.pending.lock().await.len()
    }
}
