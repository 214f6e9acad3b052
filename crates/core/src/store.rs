// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Versioned object store abstraction

use crate::record::{LockRecord, Version};
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from object store calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {namespace}/{name}")]
    NotFound { namespace: String, name: String },
    #[error("record already exists: {namespace}/{name}")]
    AlreadyExists { namespace: String, name: String },
    #[error("version conflict on {namespace}/{name}: {message}")]
    Conflict {
        namespace: String,
        name: String,
        message: String,
    },
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("request rejected with status {status}: {message}")]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid {kind} {value:?}: {rule}")]
    InvalidName {
        kind: &'static str,
        value: String,
        rule: &'static str,
    },
}

impl StoreError {
    /// Retry predicate: only rate limiting is transient
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::RateLimited(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Namespaced, optimistically-versioned record store
///
/// Every successful write assigns the record a new [`Version`].
#[async_trait]
pub trait ObjectStore: Clone + Send + Sync + 'static {
    /// Read a record; fails with [`StoreError::NotFound`] when absent
    async fn read(&self, namespace: &str, name: &str) -> Result<LockRecord, StoreError>;

    /// Create a record; fails with [`StoreError::AlreadyExists`] if the name is taken
    async fn create(
        &self,
        namespace: &str,
        name: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError>;

    /// Replace the given fields only if the record is still at `expected`.
    ///
    /// Fields not named in `fields` are left untouched. A stale `expected`
    /// fails with [`StoreError::Conflict`].
    async fn conditional_replace(
        &self,
        namespace: &str,
        name: &str,
        expected: &Version,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError>;
}
