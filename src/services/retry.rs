//! Reusable retry policy with fixed or exponential backoff and random jitter.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff: Backoff,
    /// Fraction of the delay added or removed at random (0.0 - 1.0)
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(5, Duration::from_millis(500), Duration::from_secs(30))
    }
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: delay,
            max_delay: delay,
            backoff: Backoff::Fixed,
            jitter: 0.0,
        }
    }

    pub fn exponential(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff: Backoff::Exponential,
            jitter: 0.2,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Delay before retry number `retry` (1 = wait after the first failure).
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let delay_ms = self.nominal_delay_ms(retry);

        let jitter = self.jitter.clamp(0.0, 1.0);
        let delay_ms = if jitter > 0.0 && delay_ms > 0.0 {
            let factor = rand::thread_rng().gen_range(-jitter..=jitter);
            delay_ms * (1.0 + factor)
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms.max(0.0) as u64)
    }

    /// Upper bound on the time spent sleeping between attempts when every
    /// attempt fails, jitter included.
    pub fn max_total_delay(&self) -> Duration {
        let jitter = self.jitter.clamp(0.0, 1.0);
        let total_ms: f64 = (1..self.max_attempts.max(1))
            .map(|retry| self.nominal_delay_ms(retry) * (1.0 + jitter))
            .sum();

        Duration::from_millis(total_ms.ceil() as u64)
    }

    fn nominal_delay_ms(&self, retry: u32) -> f64 {
        if retry == 0 {
            return 0.0;
        }

        let base_ms = self.base_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis().max(self.base_delay.as_millis()) as f64;

        match self.backoff {
            Backoff::Fixed => base_ms,
            Backoff::Exponential => {
                let exp = 2_f64.powi(retry.saturating_sub(1).min(30) as i32);
                (base_ms * exp).min(max_ms)
            }
        }
    }

    /// Run `op` until it succeeds or attempts are exhausted, returning the
    /// last error in the latter case.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::debug!(
                        label,
                        attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Attempt failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
