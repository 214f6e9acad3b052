// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake object store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::record::{LockRecord, Version};
use crate::store::{ObjectStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Store operation kinds, for fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Read,
    Create,
    Replace,
}

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Read {
        namespace: String,
        name: String,
    },
    Create {
        namespace: String,
        name: String,
        fields: BTreeMap<String, String>,
    },
    Replace {
        namespace: String,
        name: String,
        expected: Version,
        fields: BTreeMap<String, String>,
    },
}

impl StoreCall {
    pub fn op(&self) -> StoreOp {
        match self {
            StoreCall::Read { .. } => StoreOp::Read,
            StoreCall::Create { .. } => StoreOp::Create,
            StoreCall::Replace { .. } => StoreOp::Replace,
        }
    }
}

#[derive(Default)]
struct FakeState {
    records: HashMap<(String, String), LockRecord>,
    next_version: u64,
    calls: Vec<StoreCall>,
    faults: HashMap<StoreOp, VecDeque<StoreError>>,
}

impl FakeState {
    fn bump_version(&mut self) -> Version {
        self.next_version += 1;
        Version(self.next_version.to_string())
    }

    fn take_fault(&mut self, op: StoreOp) -> Option<StoreError> {
        self.faults.get_mut(&op).and_then(VecDeque::pop_front)
    }
}

/// In-memory store with create-if-absent and version-checked replace.
///
/// Every call yields to the scheduler before touching state, so callers
/// joined on one task interleave at each store round trip.
#[derive(Clone, Default)]
pub struct FakeObjectStore {
    state: Arc<Mutex<FakeState>>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    /// Count recorded calls of one kind
    pub fn count(&self, op: StoreOp) -> usize {
        self.lock().calls.iter().filter(|c| c.op() == op).count()
    }

    /// Get a record without recording a call
    pub fn get(&self, namespace: &str, name: &str) -> Option<LockRecord> {
        self.lock()
            .records
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Insert or overwrite a record, assigning a fresh version
    pub fn put(&self, namespace: &str, name: &str, fields: &[(&str, &str)]) -> LockRecord {
        let mut state = self.lock();
        let version = state.bump_version();
        let record = LockRecord {
            namespace: namespace.to_string(),
            name: name.to_string(),
            version,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        state
            .records
            .insert((namespace.to_string(), name.to_string()), record.clone());
        record
    }

    /// Fail the next call of `op` with `error`; queued faults are consumed in order
    pub fn fail_next(&self, op: StoreOp, error: StoreError) {
        self.lock().faults.entry(op).or_default().push_back(error);
    }

    /// Fail the next `times` calls of `op` with `error`
    pub fn fail_times(&self, op: StoreOp, error: StoreError, times: usize) {
        for _ in 0..times {
            self.fail_next(op, error.clone());
        }
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn read(&self, namespace: &str, name: &str) -> Result<LockRecord, StoreError> {
        tokio::task::yield_now().await;

        let mut state = self.lock();
        state.calls.push(StoreCall::Read {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
        if let Some(error) = state.take_fault(StoreOp::Read) {
            return Err(error);
        }

        state
            .records
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn create(
        &self,
        namespace: &str,
        name: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        tokio::task::yield_now().await;

        let mut state = self.lock();
        state.calls.push(StoreCall::Create {
            namespace: namespace.to_string(),
            name: name.to_string(),
            fields: fields.clone(),
        });
        if let Some(error) = state.take_fault(StoreOp::Create) {
            return Err(error);
        }

        let key = (namespace.to_string(), name.to_string());
        if state.records.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        let record = LockRecord {
            namespace: namespace.to_string(),
            name: name.to_string(),
            version: state.bump_version(),
            fields: fields.clone(),
        };
        state.records.insert(key, record.clone());
        Ok(record)
    }

    async fn conditional_replace(
        &self,
        namespace: &str,
        name: &str,
        expected: &Version,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        tokio::task::yield_now().await;

        let mut state = self.lock();
        state.calls.push(StoreCall::Replace {
            namespace: namespace.to_string(),
            name: name.to_string(),
            expected: expected.clone(),
            fields: fields.clone(),
        });
        if let Some(error) = state.take_fault(StoreOp::Replace) {
            return Err(error);
        }

        let key = (namespace.to_string(), name.to_string());
        let current = match state.records.get(&key) {
            Some(record) => record.version.clone(),
            None => {
                return Err(StoreError::NotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
        };
        if &current != expected {
            return Err(StoreError::Conflict {
                namespace: namespace.to_string(),
                name: name.to_string(),
                message: format!("expected version {}, found {}", expected, current),
            });
        }

        let version = state.bump_version();
        let record = state
            .records
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;
        record.version = version;
        record
            .fields
            .extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(record.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
