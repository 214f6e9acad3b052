// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock record model
//!
//! A lock is a single namespaced record whose `locked` field holds either the
//! literal `"false"` (free) or the identifier of the current leaser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

/// Field carrying the lock owner
pub const LOCKED_FIELD: &str = "locked";

/// Value of [`LOCKED_FIELD`] when the lock is free
pub const UNLOCKED: &str = "false";

/// Opaque, server-assigned optimistic-concurrency token.
///
/// Only equality is meaningful; tokens are not ordered.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub String);

impl Version {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rejected leaser identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidLeaser {
    #[error("leaser name must not be empty")]
    Empty,
    #[error("leaser name \"false\" is reserved for the unlocked state")]
    Reserved,
}

/// Caller-supplied identity that owns a held lock
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Leaser(String);

impl Leaser {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidLeaser> {
        let id = id.into();
        if id.is_empty() {
            return Err(InvalidLeaser::Empty);
        }
        if id == UNLOCKED {
            return Err(InvalidLeaser::Reserved);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Leaser {
    type Err = InvalidLeaser;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Leaser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A lock record as stored in the cluster
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LockRecord {
    pub namespace: String,
    pub name: String,
    pub version: Version,
    pub fields: BTreeMap<String, String>,
}

impl LockRecord {
    /// Raw value of the `locked` field, if the record carries one
    pub fn locked_value(&self) -> Option<&str> {
        self.fields.get(LOCKED_FIELD).map(String::as_str)
    }

    pub fn state(&self) -> LockState {
        match self.locked_value() {
            Some(UNLOCKED) => LockState::Free,
            Some(leaser) => LockState::Held {
                leaser: leaser.to_string(),
            },
            None => LockState::Unmanaged,
        }
    }

    /// Check if the record names `leaser` as the current owner
    pub fn is_held_by(&self, leaser: &Leaser) -> bool {
        self.locked_value() == Some(leaser.as_str())
    }
}

/// Lock state as observed by a caller
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LockState {
    /// No record exists; the lock has never been acquired
    Absent,
    /// Record exists with `locked == "false"`
    Free,
    /// Record names a leaser
    Held { leaser: String },
    /// Record exists without a `locked` field
    Unmanaged,
}

impl LockState {
    pub fn of(record: Option<&LockRecord>) -> Self {
        record.map_or(LockState::Absent, LockRecord::state)
    }

    /// Check if an acquire could take the lock from this state
    pub fn is_available(&self) -> bool {
        matches!(self, LockState::Absent | LockState::Free)
    }

    pub fn leaser(&self) -> Option<&str> {
        match self {
            LockState::Held { leaser } => Some(leaser),
            _ => None,
        }
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockState::Absent => write!(f, "absent"),
            LockState::Free => write!(f, "free"),
            LockState::Held { leaser } => write!(f, "held by {}", leaser),
            LockState::Unmanaged => write!(f, "unmanaged (no `{}` field)", LOCKED_FIELD),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
