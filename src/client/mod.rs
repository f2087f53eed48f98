use std::sync::Arc;

use crate::request_context::RequestDispatchContext;
use crate::session::SessionHandler;

mod impls;

/// Authenticated client for the job board API.
///
/// Clones share tokens, cache and in-flight state; the cache sweeper stops once the
/// last clone is dropped.
#[derive(Clone)]
pub struct ApiClient {
    ctx: RequestDispatchContext,
    session: Arc<dyn SessionHandler>,
}
