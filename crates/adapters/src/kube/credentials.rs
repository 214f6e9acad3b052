// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution
//!
//! Sources are probed in a fixed order and the first one present wins:
//! 1. the kubeconfig named by `KUBECONFIG`
//! 2. `~/.kube/config`
//! 3. in-cluster service-account token and CA certificate
//!
//! Resolution reads only the [`Environment`] it is handed, so it can be
//! exercised against fixture directories.

use super::kubeconfig::Kubeconfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Well-known service-account mount inside a pod
pub const SERVICEACCOUNT_ROOT: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Errors from credential resolution
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no authentication source available (checked {checked})")]
    Unavailable { checked: String },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid kubeconfig {path}: {message}")]
    InvalidKubeconfig { path: PathBuf, message: String },
    #[error("kubeconfig has no current-context")]
    NoCurrentContext,
    #[error("kubeconfig context not found: {0}")]
    ContextNotFound(String),
    #[error("kubeconfig cluster not found: {0}")]
    ClusterNotFound(String),
    #[error("kubeconfig user not found: {0}")]
    UserNotFound(String),
    #[error("unsupported authentication for user {user}: {kind}")]
    UnsupportedAuth { user: String, kind: &'static str },
    #[error("in-cluster environment incomplete: {0} is not set")]
    MissingServiceEnv(&'static str),
    #[error("invalid base64 in {field}: {message}")]
    InvalidBase64 { field: &'static str, message: String },
    #[error("invalid TLS material: {0}")]
    Tls(String),
}

impl CredentialError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        CredentialError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// How the server certificate is verified
#[derive(Clone, PartialEq, Eq)]
pub enum TrustAnchor {
    /// Platform roots
    System,
    /// PEM bundle from kubeconfig or the service-account mount
    Pem(Vec<u8>),
    /// `insecure-skip-tls-verify`
    Insecure,
}

impl std::fmt::Debug for TrustAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustAnchor::System => write!(f, "System"),
            TrustAnchor::Pem(pem) => write!(f, "Pem({} bytes)", pem.len()),
            TrustAnchor::Insecure => write!(f, "Insecure"),
        }
    }
}

/// Per-request credentials
#[derive(Clone, PartialEq, Eq)]
pub enum Authentication {
    Anonymous,
    Bearer(String),
    Basic { username: String, password: String },
    /// Mutual TLS; applied to the connection rather than each request
    ClientCertificate { cert_pem: Vec<u8>, key_pem: Vec<u8> },
}

impl Authentication {
    /// `Authorization` header value, if this identity sends one
    pub fn authorization(&self) -> Option<String> {
        use base64::Engine;

        match self {
            Authentication::Bearer(token) => Some(format!("Bearer {}", token)),
            Authentication::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", encoded))
            }
            Authentication::Anonymous | Authentication::ClientCertificate { .. } => None,
        }
    }
}

impl std::fmt::Debug for Authentication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authentication::Anonymous => write!(f, "Anonymous"),
            Authentication::Bearer(_) => write!(f, "Bearer(<redacted>)"),
            Authentication::Basic { username, .. } => {
                write!(f, "Basic {{ username: {:?}, password: <redacted> }}", username)
            }
            Authentication::ClientCertificate { .. } => write!(f, "ClientCertificate(<redacted>)"),
        }
    }
}

/// Everything needed to talk to one cluster as one identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIdentity {
    /// Base URL without a trailing slash
    pub server: String,
    pub trust: TrustAnchor,
    pub auth: Authentication,
    /// Default namespace from the kubeconfig context or service account
    pub namespace: Option<String>,
}

/// Snapshot of the process inputs resolution depends on
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Value of `KUBECONFIG`
    pub kubeconfig: Option<String>,
    pub home: Option<PathBuf>,
    pub service_account_root: PathBuf,
    /// `KUBERNETES_SERVICE_HOST`
    pub service_host: Option<String>,
    /// `KUBERNETES_SERVICE_PORT`
    pub service_port: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        Self {
            kubeconfig: non_empty_var("KUBECONFIG"),
            home: dirs::home_dir(),
            service_account_root: PathBuf::from(SERVICEACCOUNT_ROOT),
            service_host: non_empty_var("KUBERNETES_SERVICE_HOST"),
            service_port: non_empty_var("KUBERNETES_SERVICE_PORT"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// A place credentials can come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    ExplicitKubeconfig(PathBuf),
    UserKubeconfig(PathBuf),
    InCluster { root: PathBuf },
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::ExplicitKubeconfig(path) => {
                write!(f, "KUBECONFIG ({})", path.display())
            }
            CredentialSource::UserKubeconfig(path) => write!(f, "{}", path.display()),
            CredentialSource::InCluster { root } => {
                write!(f, "in-cluster service account ({})", root.display())
            }
        }
    }
}

impl CredentialSource {
    /// Load this source, or `None` when it is not present.
    ///
    /// An explicit kubeconfig is always considered present, so a bad
    /// `KUBECONFIG` is an error instead of a silent fall-through.
    pub fn load(&self, env: &Environment) -> Result<Option<ClusterIdentity>, CredentialError> {
        match self {
            CredentialSource::ExplicitKubeconfig(path) => Kubeconfig::load(path)?.identity().map(Some),
            CredentialSource::UserKubeconfig(path) => {
                if !path.is_file() {
                    return Ok(None);
                }
                Kubeconfig::load(path)?.identity().map(Some)
            }
            CredentialSource::InCluster { root } => load_in_cluster(root, env),
        }
    }
}

/// Candidate sources for `env`, highest precedence first
pub fn candidates(env: &Environment) -> Vec<CredentialSource> {
    let mut sources = Vec::new();
    if let Some(path) = env
        .kubeconfig
        .as_deref()
        .and_then(|value| std::env::split_paths(value).find(|p| !p.as_os_str().is_empty()))
    {
        sources.push(CredentialSource::ExplicitKubeconfig(path));
    }
    if let Some(home) = &env.home {
        sources.push(CredentialSource::UserKubeconfig(home.join(".kube").join("config")));
    }
    sources.push(CredentialSource::InCluster {
        root: env.service_account_root.clone(),
    });
    sources
}

/// Resolve the first available source
pub fn resolve(env: &Environment) -> Result<(CredentialSource, ClusterIdentity), CredentialError> {
    let sources = candidates(env);
    for source in &sources {
        if let Some(identity) = source.load(env)? {
            tracing::debug!(source = %source, server = %identity.server, "resolved credentials");
            return Ok((source.clone(), identity));
        }
        tracing::trace!(source = %source, "credential source not present");
    }

    Err(CredentialError::Unavailable {
        checked: sources
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn load_in_cluster(root: &Path, env: &Environment) -> Result<Option<ClusterIdentity>, CredentialError> {
    let token_path = root.join("token");
    let ca_path = root.join("ca.crt");
    if !token_path.is_file() || !ca_path.is_file() {
        return Ok(None);
    }

    let host = env
        .service_host
        .as_deref()
        .ok_or(CredentialError::MissingServiceEnv("KUBERNETES_SERVICE_HOST"))?;
    let port = env
        .service_port
        .as_deref()
        .ok_or(CredentialError::MissingServiceEnv("KUBERNETES_SERVICE_PORT"))?;

    let token = read_to_string(&token_path)?.trim().to_string();
    let ca = std::fs::read(&ca_path).map_err(|e| CredentialError::io(&ca_path, e))?;
    let namespace = match std::fs::read_to_string(root.join("namespace")) {
        Ok(ns) => Some(ns.trim().to_string()).filter(|ns| !ns.is_empty()),
        Err(_) => None,
    };

    // IPv6 literals must be bracketed in URLs
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };

    Ok(Some(ClusterIdentity {
        server: format!("https://{}:{}", host, port),
        trust: TrustAnchor::Pem(ca),
        auth: Authentication::Bearer(token),
        namespace,
    }))
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, CredentialError> {
    std::fs::read_to_string(path).map_err(|e| CredentialError::io(path, e))
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
