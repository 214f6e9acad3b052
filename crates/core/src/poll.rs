// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poll an operation until it yields a value or a deadline passes
//!
//! Domain-agnostic: the operation reports "not yet" with `Ok(None)`. Each
//! poll tracks its own deadline and interval, so any number can run
//! concurrently on one runtime.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Growth factor applied to the delay when backoff is enabled
pub const BACKOFF_FACTOR: f64 = 1.5;

/// Errors from [`poll_until`]
#[derive(Debug, Error)]
pub enum PollError<E> {
    /// The deadline passed before the operation produced a value
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    /// The operation itself failed
    #[error("{0}")]
    Operation(E),
}

impl<E> PollError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PollError::Timeout(_))
    }
}

/// Polling schedule
#[derive(Clone, Debug, PartialEq)]
pub struct PollOptions {
    /// Wait between attempts
    pub delay: Duration,
    /// Overall deadline; `None` polls forever
    pub timeout: Option<Duration>,
    /// Multiply `delay` by [`BACKOFF_FACTOR`] after every attempt
    pub backoff: bool,
    /// Drop an in-flight attempt when the deadline passes
    pub interrupt: bool,
}

impl PollOptions {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timeout: None,
            backoff: false,
            interrupt: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_backoff(mut self, backoff: bool) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether the deadline cancels an attempt already under way.
    ///
    /// Without interruption the deadline only gates new attempts, and the
    /// result of an attempt that started in time is returned as is.
    pub fn with_interrupt(mut self, interrupt: bool) -> Self {
        self.interrupt = interrupt;
        self
    }
}

/// Invoke `op` until it returns `Ok(Some(value))`.
///
/// The first attempt runs immediately. No attempt starts after the deadline,
/// and an in-flight attempt is dropped when it passes unless
/// [`PollOptions::interrupt`] is off. A deadline too far out to represent
/// means no deadline.
pub async fn poll_until<T, E, F, Fut>(options: &PollOptions, mut op: F) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = options
        .timeout
        .and_then(|timeout| Instant::now().checked_add(timeout).map(|at| (at, timeout)));
    let mut delay = options.delay;
    let mut attempt: u32 = 0;

    loop {
        if let Some((at, timeout)) = deadline {
            if Instant::now() >= at {
                tracing::debug!(attempt, "poll deadline reached");
                return Err(PollError::Timeout(timeout));
            }
        }

        attempt += 1;
        let outcome = match deadline.filter(|_| options.interrupt) {
            Some((at, timeout)) => match tokio::time::timeout_at(at, op()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::debug!(attempt, "poll deadline reached mid-attempt");
                    return Err(PollError::Timeout(timeout));
                }
            },
            None => op().await,
        };

        if let Some(value) = outcome.map_err(PollError::Operation)? {
            return Ok(value);
        }

        tracing::trace!(attempt, delay_ms = delay.as_millis() as u64, "not ready");
        match deadline {
            Some((at, _)) => {
                let wake = Instant::now().checked_add(delay).map_or(at, |t| t.min(at));
                tokio::time::sleep_until(wake).await
            }
            None => tokio::time::sleep(delay).await,
        }

        if options.backoff {
            delay = Duration::try_from_secs_f64(delay.as_secs_f64() * BACKOFF_FACTOR)
                .unwrap_or(Duration::MAX);
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
