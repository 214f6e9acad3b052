// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes ConfigMap store and credential resolution

mod client;
mod credentials;
mod kubeconfig;
pub mod wire;

pub use client::{resolve_client, KubeClient, ResolvedClient, DEFAULT_TIMEOUT};
pub use credentials::{
    candidates, resolve, Authentication, ClusterIdentity, CredentialError, CredentialSource,
    Environment, TrustAnchor, SERVICEACCOUNT_ROOT,
};
pub use kubeconfig::Kubeconfig;
