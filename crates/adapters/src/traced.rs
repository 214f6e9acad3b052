// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use async_trait::async_trait;
use kubelock_core::{LockRecord, ObjectStore, StoreError, Version};
use std::collections::BTreeMap;
use std::future::Future;
use tracing::Instrument;

/// Wrapper that adds tracing to any ObjectStore
#[derive(Debug, Clone)]
pub struct TracedObjectStore<S> {
    inner: S,
}

impl<S> TracedObjectStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// Run one store call, logging its outcome and latency
async fn timed<F>(span: tracing::Span, call: F) -> Result<LockRecord, StoreError>
where
    F: Future<Output = Result<LockRecord, StoreError>>,
{
    async move {
        let start = std::time::Instant::now();
        let result = call.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(record) => tracing::debug!(version = %record.version, elapsed_ms, "ok"),
            // Absent records and lost races are routine for a lock
            Err(
                e @ (StoreError::NotFound { .. }
                | StoreError::AlreadyExists { .. }
                | StoreError::Conflict { .. }),
            ) => tracing::debug!(elapsed_ms, error = %e, "rejected"),
            Err(e) if e.is_transient() => tracing::warn!(elapsed_ms, error = %e, "throttled"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
        }

        result
    }
    .instrument(span)
    .await
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for TracedObjectStore<S> {
    async fn read(&self, namespace: &str, name: &str) -> Result<LockRecord, StoreError> {
        let span = tracing::info_span!("store.read", namespace, name);
        timed(span, self.inner.read(namespace, name)).await
    }

    async fn create(
        &self,
        namespace: &str,
        name: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        let span = tracing::info_span!(
            "store.create",
            namespace,
            name,
            field_count = fields.len()
        );
        timed(span, self.inner.create(namespace, name, fields)).await
    }

    async fn conditional_replace(
        &self,
        namespace: &str,
        name: &str,
        expected: &Version,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        let span = tracing::info_span!("store.replace", namespace, name, expected = %expected);
        timed(
            span,
            self.inner
                .conditional_replace(namespace, name, expected, fields),
        )
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
