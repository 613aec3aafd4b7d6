//! Bounded fixed-delay retry of transport faults.

use std::future::Future;
use std::time::Duration;

use crate::outcome::RemoteOutcome;

/// Retry and timeout settings for outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
    /// Per-attempt request timeout.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs `attempt` until it yields a non-transient outcome or the policy's
/// attempt budget is spent; the last transient failure is returned then.
///
/// `attempt` receives the 1-based attempt number.
pub async fn retry_transient<F, Fut>(
    policy: &RetryPolicy,
    target: &str,
    mut attempt: F,
) -> RemoteOutcome
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = RemoteOutcome>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut number = 1;

    loop {
        metrics::counter!("remote_call_attempts_total").increment(1);
        let outcome = attempt(number).await;

        if !outcome.is_transient() || number >= max_attempts {
            if outcome.is_transient() {
                tracing::error!(endpoint = target, attempts = number, "remote call failed after retries");
            }
            return outcome;
        }

        metrics::counter!("remote_call_retries_total").increment(1);
        tracing::info!(
            endpoint = target,
            attempt = number,
            delay_ms = policy.delay.as_millis() as u64,
            "transient failure, retrying"
        );
        tokio::time::sleep(policy.delay).await;
        number += 1;
    }
}
