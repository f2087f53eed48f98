use std::str::FromStr;
use std::time::Duration;

use rand::Rng;
use reqwest::Method;
use serde::Deserialize;

use crate::errors::Error;

/// Strategy for adding randomness to delay calculations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JitterStrategy {
    #[default]
    None,
    Full,
}

/// Retry/backoff configuration shared by every request the client sends.
#[derive(Clone, Debug)]
pub struct RetryPlan {
    pub max_retries: u8,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: JitterStrategy,
    /// Skip retries for POST and PATCH.
    pub idempotent_only: bool,
}

impl RetryPlan {
    pub fn new(max_retries: u8, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default_plan()
        }
    }

    pub fn default_plan() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: JitterStrategy::None,
            idempotent_only: false,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            jitter: config.retry_jitter,
            idempotent_only: config.retry_idempotent_only,
        }
    }

    pub fn with_jitter(mut self, jitter: JitterStrategy) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_idempotent_only(mut self, idempotent_only: bool) -> Self {
        self.idempotent_only = idempotent_only;
        self
    }

    pub fn should_retry(&self, err: &Error, method: &Method, retries_remaining: u8) -> bool {
        if retries_remaining == 0 || !err.is_retryable() {
            return false;
        }
        !(self.idempotent_only && !is_idempotent(method))
    }

    /// Delay before the next attempt; doubles with every retry consumed from `budget`.
    pub fn delay_for(&self, budget: u8, retries_remaining: u8, rng: &mut impl Rng) -> Duration {
        let consumed = budget.saturating_sub(retries_remaining) as u32;
        let factor = 2u32.saturating_pow(consumed);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        match self.jitter {
            JitterStrategy::None => delay,
            JitterStrategy::Full => delay.mul_f64(rng.gen_range(0.0..1.0)),
        }
    }
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}

fn is_idempotent(method: &Method) -> bool {
    !matches!(*method, Method::POST | Method::PATCH)
}

impl FromStr for JitterStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(JitterStrategy::None),
            "full" => Ok(JitterStrategy::Full),
            other => Err(Error::Config(format!(
                "Unknown jitter strategy '{}'; expected 'none' or 'full'",
                other
            ))),
        }
    }
}
