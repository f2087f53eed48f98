use std::time::Duration;

use crate::config::Config;
use crate::errors::Error;

/// When the client refreshes ahead of a 401.
#[derive(Clone, Debug)]
pub struct RefreshPolicy {
    /// Remaining access-token lifetime below which a refresh is due.
    pub threshold: Duration,
    /// Refresh before sending instead of waiting for a 401.
    pub proactive: bool,
}

impl RefreshPolicy {
    pub fn new(threshold: Duration, proactive: bool) -> Result<Self, Error> {
        if threshold.is_zero() {
            return Err(Error::Config("Refresh threshold must be > 0".into()));
        }
        Ok(Self {
            threshold,
            proactive,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let policy = Self::new(config.refresh_threshold(), config.proactive_refresh)?;
        let access_ttl = Duration::from_secs(config.access_token_ttl_secs);
        if policy.proactive && !access_ttl.is_zero() && policy.threshold >= access_ttl {
            return Err(Error::Config(
                "Refresh threshold must be shorter than the access token lifetime".into(),
            ));
        }
        Ok(policy)
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            threshold: Duration::from_millis(300_000),
            proactive: true,
        }
    }
}
