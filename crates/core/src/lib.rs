// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! kubelock-core: cluster-wide advisory mutex over a versioned object store
//!
//! This crate provides:
//! - The lock record model (`LockRecord`, `Version`, `Leaser`, `LockState`)
//! - The `ObjectStore` trait the protocol runs against
//! - A transient-failure retry wrapper with jittered exponential backoff
//! - A generic poll-until-successful combinator with deadline cancellation
//! - The acquire/release protocol itself (`Locker`)

pub mod lock;
pub mod poll;
pub mod record;
pub mod retry;
pub mod store;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use lock::{AcquireOutcome, LockError, Locker};
pub use poll::{poll_until, PollError, PollOptions};
pub use record::{InvalidLeaser, Leaser, LockRecord, LockState, Version, LOCKED_FIELD, UNLOCKED};
pub use retry::{retry_transient, RetryPolicy};
pub use store::{ObjectStore, StoreError};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeObjectStore, StoreCall, StoreOp};
