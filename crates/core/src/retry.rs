// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient-failure retry with jittered exponential backoff
//!
//! Wraps a single remote call. Failures matching the transient predicate are
//! retried after a delay that starts at the base interval (with random jitter
//! on the first delay only) and grows by the backoff factor each time, up to
//! a bounded number of attempts. Anything else propagates immediately.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry schedule for transient failures
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Base delay before the first retry
    pub interval: Duration,
    /// Total number of invocations, including the first
    pub max_attempts: u32,
    /// Multiplier applied to the delay after every retry
    pub backoff: f64,
    /// Fraction of `interval` applied as random jitter (±) to the first delay
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            max_attempts: 15,
            backoff: 2.0,
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::default().with_max_attempts(1)
    }

    /// Delay before the first retry, with jitter applied
    pub fn first_delay(&self) -> Duration {
        let jitter = sanitize(self.jitter).min(1.0);
        if jitter == 0.0 {
            return self.interval;
        }
        // rng is not Send; keep it out of any await
        let factor = 1.0 + rand::rng().random_range(-jitter..=jitter);
        scale(self.interval, factor)
    }

    /// Delay following `delay` in the schedule
    pub fn next_delay(&self, delay: Duration) -> Duration {
        scale(delay, sanitize(self.backoff))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

fn scale(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Invoke `op`, retrying failures for which `is_transient` holds.
///
/// Returns the first success, the first non-transient failure, or the last
/// transient failure once `policy.max_attempts` invocations have been made.
pub async fn retry_transient<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_transient: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.attempts();
    let mut delay = policy.first_delay();
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                tracing::debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                delay = policy.next_delay(delay);
                attempt += 1;
            }
            Err(e) => {
                if attempt > 1 {
                    tracing::warn!(attempt, error = %e, "giving up");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
