// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment overrides for retry and request timing

use kubelock_adapters::kube::DEFAULT_TIMEOUT;
use kubelock_core::RetryPolicy;
use std::time::Duration;

pub const RETRY_INTERVAL_MS: &str = "KUBELOCK_RETRY_INTERVAL_MS";
pub const RETRY_ATTEMPTS: &str = "KUBELOCK_RETRY_ATTEMPTS";
pub const TIMEOUT_REQUEST_MS: &str = "KUBELOCK_TIMEOUT_REQUEST_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub retry: RetryPolicy,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut retry = RetryPolicy::default();
        if let Some(interval) = parse_duration_ms(lookup(RETRY_INTERVAL_MS)) {
            retry = retry.with_interval(interval);
        }
        if let Some(attempts) = lookup(RETRY_ATTEMPTS).and_then(|s| s.trim().parse::<u32>().ok()) {
            retry = retry.with_max_attempts(attempts);
        }

        Self {
            retry,
            request_timeout: parse_duration_ms(lookup(TIMEOUT_REQUEST_MS)).unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

fn parse_duration_ms(value: Option<String>) -> Option<Duration> {
    value
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
