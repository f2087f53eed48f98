//! Hook for the terminal auth failure.

use tracing::warn;

/// Notified once the session can no longer be recovered and the user has to log in
/// again. Tokens are already cleared when this runs.
pub trait SessionHandler: Send + Sync {
    fn session_expired(&self, login_route: &str);
}

/// Default handler: records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl SessionHandler for LogRedirect {
    fn session_expired(&self, login_route: &str) {
        warn!(route = login_route, "session.expired");
    }
}
