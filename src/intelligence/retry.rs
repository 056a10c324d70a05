//! # intelligence::retry
//!
//! Exponential backoff + jitter for rate-limited / unavailable providers.
//!
//! ```text
//! delay(n) = min(base × 2ⁿ + jitter × U[0,1], max_delay)
//! stop when: success | non-retryable error | attempts == max | elapsed + delay > budget
//! ```

use std::{future::Future, time::Duration};

use rand::Rng;
use tokio::time::{sleep, Instant};
use tracing::warn;

use super::ProviderError;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total calls including the first one.
    pub max_attempts: u32,
    pub base_delay:   Duration,
    pub max_delay:    Duration,
    pub jitter:       Duration,
    /// Give up when the next sleep would push the call past this.
    pub budget:       Duration,
}

impl RetryPolicy {
    /// Free-text commentary. Patient: the user is not waiting on it.
    pub fn commentary() -> Self {
        Self {
            max_attempts: 8,
            base_delay:   Duration::from_secs(2),
            max_delay:    Duration::from_secs(60),
            jitter:       Duration::from_secs(1),
            budget:       Duration::from_secs(180),
        }
    }

    /// Proposals and lessons. The request is blocked on these.
    pub fn structured() -> Self {
        Self {
            max_attempts: 3,
            base_delay:   Duration::from_secs(1),
            max_delay:    Duration::from_secs(10),
            jitter:       Duration::from_millis(500),
            budget:       Duration::from_secs(30),
        }
    }

    /// Sleep before retry number `retry` (0-based).
    pub fn delay_for<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let exp    = self.base_delay.saturating_mul(2u32.saturating_pow(retry));
        let jitter = self.jitter.mul_f64(rng.gen_range(0.0..=1.0));
        exp.saturating_add(jitter).min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy runs out.
/// The last error is returned as is.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T, ProviderError>
where
    F:   FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let started = Instant::now();
    let mut attempt = 1;

    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) => e,
        };

        if attempt >= policy.max_attempts.max(1) {
            warn!(call = label, attempts = attempt, error = %err, "🧠 [RETRY] Attempts exhausted");
            return Err(err);
        }

        let delay = policy.delay_for(attempt - 1, &mut rand::thread_rng());
        if started.elapsed() + delay > policy.budget {
            warn!(call = label, attempts = attempt, error = %err, "🧠 [RETRY] Time budget exhausted");
            return Err(err);
        }

        warn!(
            call     = label,
            attempt,
            max      = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            error    = %err,
            "🧠 [RETRY] Provider throttled, backing off"
        );
        sleep(delay).await;
        attempt += 1;
    }
}
