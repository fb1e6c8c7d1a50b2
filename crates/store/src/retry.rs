//! Bounded retry with linearly increasing delay.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as at least 1.
    pub attempts: u32,
    /// Delay unit; the wait after failed attempt `n` is `n * step`.
    pub step: Duration,
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }
}

/// Run `op` until it succeeds or `policy.attempts` is exhausted.
///
/// `op` receives the 1-based attempt number. The last error is returned
/// unchanged.
pub async fn retry_linear<T, E, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(what, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if attempt < attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    what,
                    attempt,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!(what, attempts, error = %e, "giving up after final attempt");
                return Err(e);
            }
        }
    }
}
