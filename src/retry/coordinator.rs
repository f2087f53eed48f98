use rand::{SeedableRng, rngs::StdRng};
use reqwest::Method;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use crate::errors::Error;

use super::{RetryOutcome, plan::RetryPlan};

pub struct RetryCoordinator {
    plan: RetryPlan,
    rng: Mutex<StdRng>,
}

impl RetryCoordinator {
    pub fn new(plan: RetryPlan) -> Self {
        Self {
            plan,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn plan(&self) -> RetryPlan {
        self.plan.clone()
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or `budget`
    /// retries have been spent. `op` receives the 1-based attempt number.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: &str,
        method: &Method,
        budget: u8,
        mut op: F,
    ) -> Result<(T, RetryOutcome), Error>
    where
        F: FnMut(u8) -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, Error>> + Send,
    {
        let mut attempt: u8 = 1;
        let mut retries_remaining = budget;
        let start = Instant::now();
        loop {
            match op(attempt).await {
                Ok(value) => {
                    let outcome = RetryOutcome {
                        operation: operation.to_string(),
                        method: method.clone(),
                        attempts: attempt,
                        success: true,
                        total_delay: start.elapsed(),
                        last_error: None,
                    };
                    outcome.log();
                    return Ok((value, outcome));
                }
                Err(err) => {
                    if !self.plan.should_retry(&err, method, retries_remaining) {
                        let outcome = RetryOutcome {
                            operation: operation.to_string(),
                            method: method.clone(),
                            attempts: attempt,
                            success: false,
                            total_delay: start.elapsed(),
                            last_error: Some(err.to_string()),
                        };
                        outcome.log();
                        return Err(err);
                    }
                    let delay = {
                        let mut rng = self.rng.lock().await;
                        self.plan.delay_for(budget, retries_remaining, &mut *rng)
                    };
                    warn!(
                        operation = %operation,
                        attempt,
                        retries_remaining,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retry.scheduling"
                    );
                    tokio::time::sleep(delay).await;
                    retries_remaining -= 1;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}

impl Default for RetryCoordinator {
    fn default() -> Self {
        Self::new(RetryPlan::default_plan())
    }
}
