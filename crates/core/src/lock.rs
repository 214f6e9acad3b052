// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock protocol: acquire and release over a shared versioned record
//!
//! Both operations are single-shot read-then-write sequences. Mutual
//! exclusion comes entirely from the store: create-if-absent for the first
//! acquire, and version-checked replace for every later transition. Every
//! store call goes through [`retry_transient`]; nothing else is retried.

use crate::poll::{poll_until, PollError, PollOptions};
use crate::record::{InvalidLeaser, Leaser, LockRecord, LockState, Version, LOCKED_FIELD, UNLOCKED};
use crate::retry::{retry_transient, RetryPolicy};
use crate::store::{ObjectStore, StoreError};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from lock operations
#[derive(Debug, Error)]
pub enum LockError {
    #[error(transparent)]
    InvalidLeaser(#[from] InvalidLeaser),
    #[error("lock {namespace}/{name} does not exist")]
    NotFound { namespace: String, name: String },
    #[error("lock {namespace}/{name} is not held by {leaser}; current leaser is {current}")]
    NotHeldByCaller {
        namespace: String,
        name: String,
        leaser: String,
        current: LockState,
    },
    #[error("lock {namespace}/{name} was modified concurrently: {message}")]
    VersionConflict {
        namespace: String,
        name: String,
        message: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Detailed result of an acquire attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The caller now holds the lock
    Acquired,
    /// Someone (possibly the caller) already holds it
    Held { leaser: String },
    /// The record exists but is not a lock this protocol manages
    Unmanaged,
    /// Another writer won between our read and our write
    LostRace,
}

impl AcquireOutcome {
    pub fn is_acquired(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired)
    }
}

/// Acquire/release client over an [`ObjectStore`]
///
/// Holds no lock state of its own; every call re-reads the record.
#[derive(Clone)]
pub struct Locker<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: ObjectStore> Locker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Acquire `name` for `leaser`.
    ///
    /// `Ok(false)` is ordinary contention: the lock is held, or another
    /// writer won a race for it.
    pub async fn acquire(&self, namespace: &str, name: &str, leaser: &str) -> Result<bool, LockError> {
        let leaser = Leaser::new(leaser)?;
        Ok(self.try_acquire(namespace, name, &leaser).await?.is_acquired())
    }

    pub async fn try_acquire(
        &self,
        namespace: &str,
        name: &str,
        leaser: &Leaser,
    ) -> Result<AcquireOutcome, LockError> {
        let fields = locked_fields(leaser.as_str());

        let record = match self.read(namespace, name).await {
            Ok(record) => record,
            Err(StoreError::NotFound { .. }) => {
                return match self.create(namespace, name, &fields).await {
                    Ok(_) => {
                        info!(namespace, name, leaser = %leaser, "lock created and acquired");
                        Ok(AcquireOutcome::Acquired)
                    }
                    Err(StoreError::AlreadyExists { .. }) => {
                        warn!(namespace, name, leaser = %leaser, "lost lock creation race");
                        Ok(AcquireOutcome::LostRace)
                    }
                    Err(e) => Err(e.into()),
                };
            }
            Err(e) => return Err(e.into()),
        };

        match record.state() {
            LockState::Free => {}
            LockState::Held { leaser: current } => {
                debug!(namespace, name, leaser = %leaser, current = %current, "lock is held");
                return Ok(AcquireOutcome::Held { leaser: current });
            }
            LockState::Unmanaged | LockState::Absent => {
                warn!(namespace, name, "record has no `{}` field", LOCKED_FIELD);
                return Ok(AcquireOutcome::Unmanaged);
            }
        }

        match self.replace(namespace, name, &record.version, &fields).await {
            Ok(_) => {
                info!(namespace, name, leaser = %leaser, "lock acquired");
                Ok(AcquireOutcome::Acquired)
            }
            Err(StoreError::Conflict { message, .. }) => {
                warn!(namespace, name, leaser = %leaser, detail = %message, "lost lock update race");
                Ok(AcquireOutcome::LostRace)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release `name` held by `leaser`.
    ///
    /// Fails if the lock does not exist, is not held by `leaser`, or was
    /// modified between the read and the write.
    pub async fn release(&self, namespace: &str, name: &str, leaser: &str) -> Result<(), LockError> {
        let leaser = Leaser::new(leaser)?;

        let record = match self.read(namespace, name).await {
            Ok(record) => record,
            Err(StoreError::NotFound { .. }) => {
                return Err(LockError::NotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        if !record.is_held_by(&leaser) {
            return Err(LockError::NotHeldByCaller {
                namespace: namespace.to_string(),
                name: name.to_string(),
                leaser: leaser.to_string(),
                current: record.state(),
            });
        }

        match self
            .replace(namespace, name, &record.version, &locked_fields(UNLOCKED))
            .await
        {
            Ok(_) => {
                info!(namespace, name, leaser = %leaser, "lock released");
                Ok(())
            }
            Err(StoreError::Conflict { message, .. }) => Err(LockError::VersionConflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
                message,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Current state of `name`; never writes
    pub async fn inspect(&self, namespace: &str, name: &str) -> Result<LockState, LockError> {
        match self.read(namespace, name).await {
            Ok(record) => Ok(record.state()),
            Err(StoreError::NotFound { .. }) => Ok(LockState::Absent),
            Err(e) => Err(e.into()),
        }
    }

    /// Poll [`try_acquire`](Self::try_acquire) until the lock is ours.
    ///
    /// Contention keeps polling; any [`LockError`] stops it. The deadline
    /// only gates new attempts: a write already sent may still land, so an
    /// attempt under way runs to completion and its result is reported.
    pub async fn acquire_within(
        &self,
        namespace: &str,
        name: &str,
        leaser: &Leaser,
        options: &PollOptions,
    ) -> Result<(), PollError<LockError>> {
        let options = options.clone().with_interrupt(false);
        poll_until(&options, move || async move {
            let outcome = self.try_acquire(namespace, name, leaser).await?;
            Ok::<_, LockError>(outcome.is_acquired().then_some(()))
        })
        .await
    }

    async fn read(&self, namespace: &str, name: &str) -> Result<LockRecord, StoreError> {
        let store = &self.store;
        retry_transient(&self.retry, StoreError::is_transient, move || {
            store.read(namespace, name)
        })
        .await
    }

    async fn create(
        &self,
        namespace: &str,
        name: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        let store = &self.store;
        retry_transient(&self.retry, StoreError::is_transient, move || {
            store.create(namespace, name, fields)
        })
        .await
    }

    async fn replace(
        &self,
        namespace: &str,
        name: &str,
        expected: &Version,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        let store = &self.store;
        retry_transient(&self.retry, StoreError::is_transient, move || {
            store.conditional_replace(namespace, name, expected, fields)
        })
        .await
    }
}

fn locked_fields(value: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(LOCKED_FIELD.to_string(), value.to_string())])
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
