// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod acquire;
pub mod release;
pub mod run;
pub mod status;
pub mod wait;

use anyhow::{Context as _, Result};
use clap::Args;
use kubelock_adapters::{resolve_client, Environment, KubeClient, TracedObjectStore};
use kubelock_core::{Leaser, Locker};

use crate::config::Settings;

/// Another leaser holds the lock
pub const EXIT_HELD: u8 = 3;
/// `wait` gave up before acquiring
pub const EXIT_TIMEOUT: u8 = 4;

pub const DEFAULT_NAMESPACE: &str = "default";

pub type ClusterLocker = Locker<TracedObjectStore<KubeClient>>;

/// Lock name plus the identity acting on it
#[derive(Args, Debug, Clone)]
pub struct LockArgs {
    /// Name of the ConfigMap backing the lock
    pub name: String,

    /// Identity recorded as the lock holder
    #[arg(long, env = "KUBELOCK_LEASER")]
    pub leaser: Leaser,
}

/// Resolved cluster connection shared by every command
pub struct Context {
    pub locker: ClusterLocker,
    pub namespace: String,
}

impl Context {
    pub fn connect(namespace: Option<String>, settings: &Settings) -> Result<Self> {
        let resolved = resolve_client(&Environment::from_process(), settings.request_timeout)
            .context("failed to resolve cluster credentials")?;
        tracing::debug!(source = %resolved.source, server = resolved.client.server(), "connected");

        let namespace = pick_namespace(namespace, resolved.namespace);
        let locker = Locker::new(TracedObjectStore::new(resolved.client))
            .with_retry_policy(settings.retry.clone());
        Ok(Self { locker, namespace })
    }

    /// `namespace/name` for messages
    pub fn qualified(&self, name: &str) -> String {
        format!("{}/{}", self.namespace, name)
    }
}

/// Flag or env first, then the credential's namespace, then `default`
pub fn pick_namespace(explicit: Option<String>, from_credentials: Option<String>) -> String {
    explicit
        .filter(|ns| !ns.is_empty())
        .or(from_credentials)
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
