//! Bounded exponential backoff.
//!
//! The helper only returns the outcome; callers apply any state change once,
//! after it settles.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Total time budget. No new attempt starts once it is spent.
    pub max_elapsed: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            max_elapsed: Duration::from_secs(60),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay = self.initial_interval.as_secs_f64() * exp;
        let capped = delay.min(self.max_interval.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Run `op` until it succeeds or the policy's time budget runs out, returning
/// the last error in the latter case.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                let delay = policy.backoff(attempt);
                if started.elapsed() + delay > policy.max_elapsed {
                    warn!(label, attempt, error = %err, "Giving up after retries");
                    return Err(err);
                }
                warn!(label, attempt, error = %err, delay_ms = delay.as_millis() as u64, "Attempt failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}
