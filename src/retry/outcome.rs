use std::time::Duration;

use reqwest::Method;
use tracing::{Level, event};

/// Summary of one retried call, logged once it settles.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub operation: String,
    pub method: Method,
    pub attempts: u8,
    pub success: bool,
    pub total_delay: Duration,
    pub last_error: Option<String>,
}

impl RetryOutcome {
    pub fn retries(&self) -> u8 {
        self.attempts.saturating_sub(1)
    }

    pub fn log(&self) {
        let exhausted = !self.success && self.attempts > 1;
        if !exhausted {
            event!(
                Level::INFO,
                operation = %self.operation,
                method = %self.method,
                attempts = self.attempts,
                success = self.success,
                total_delay_ms = self.total_delay.as_millis() as u64,
                "retry.outcome"
            );
        } else {
            event!(
                Level::WARN,
                operation = %self.operation,
                method = %self.method,
                attempts = self.attempts,
                success = self.success,
                total_delay_ms = self.total_delay.as_millis() as u64,
                last_error = self.last_error.as_deref().unwrap_or("-"),
                "retry.outcome"
            );
        }
    }
}
