// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ConfigMap-backed object store over the Kubernetes REST API

use super::credentials::{
    resolve, Authentication, ClusterIdentity, CredentialError, CredentialSource, Environment,
    TrustAnchor,
};
use super::wire::{self, ConfigMap, Operation, JSON, JSON_PATCH};
use async_trait::async_trait;
use kubelock_core::{LockRecord, ObjectStore, StoreError, Version};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use ureq::tls::{Certificate, ClientCert, PemItem, PrivateKey, RootCerts, TlsConfig};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request method, carrying the body for the methods that send one
#[derive(Debug, Clone)]
enum Method {
    Get,
    Post(Vec<u8>),
    Patch(Vec<u8>),
}

struct ApiRequest {
    method: Method,
    path: String,
}

struct ApiResponse {
    status: u16,
    body: String,
}

/// Kubernetes client implementing [`ObjectStore`] with ConfigMaps
#[derive(Clone)]
pub struct KubeClient {
    agent: ureq::Agent,
    server: String,
    authorization: Option<Arc<str>>,
}

impl std::fmt::Debug for KubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClient")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

/// A client together with where its credentials came from
#[derive(Debug, Clone)]
pub struct ResolvedClient {
    pub client: KubeClient,
    pub source: CredentialSource,
    /// Default namespace of the resolved identity
    pub namespace: Option<String>,
}

/// Resolve credentials from `env` and build a client for them
pub fn resolve_client(env: &Environment, timeout: Duration) -> Result<ResolvedClient, CredentialError> {
    let (source, identity) = resolve(env)?;
    let client = KubeClient::new(&identity, timeout)?;
    Ok(ResolvedClient {
        client,
        source,
        namespace: identity.namespace,
    })
}

impl KubeClient {
    pub fn new(identity: &ClusterIdentity, timeout: Duration) -> Result<Self, CredentialError> {
        let mut tls = TlsConfig::builder();
        match &identity.trust {
            TrustAnchor::System => {}
            TrustAnchor::Pem(pem) => {
                tls = tls.root_certs(RootCerts::Specific(Arc::new(pem_certificates(pem)?)));
            }
            TrustAnchor::Insecure => {
                tracing::warn!(server = %identity.server, "TLS verification disabled");
                tls = tls.disable_verification(true);
            }
        }
        if let Authentication::ClientCertificate { cert_pem, key_pem } = &identity.auth {
            let chain = pem_certificates(cert_pem)?;
            let key = PrivateKey::from_pem(key_pem).map_err(|e| CredentialError::Tls(e.to_string()))?;
            tls = tls.client_cert(Some(ClientCert::new_with_certs(&chain, key)));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .tls_config(tls.build())
            .build()
            .into();

        Ok(Self {
            agent,
            server: identity.server.trim_end_matches('/').to_string(),
            authorization: identity.auth.authorization().map(Arc::from),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Attach credentials to an outgoing request
    fn apply_to_request<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        match &self.authorization {
            Some(value) => request.header("Authorization", value.as_ref()),
            None => request,
        }
    }

    fn send_blocking(&self, request: &ApiRequest) -> Result<ApiResponse, StoreError> {
        let url = format!("{}{}", self.server, request.path);
        let result = match &request.method {
            Method::Get => self
                .apply_to_request(self.agent.get(&url))
                .header("Accept", JSON)
                .call(),
            Method::Post(body) => self
                .apply_to_request(self.agent.post(&url))
                .header("Accept", JSON)
                .header("Content-Type", JSON)
                .send(body.as_slice()),
            Method::Patch(body) => self
                .apply_to_request(self.agent.patch(&url))
                .header("Accept", JSON)
                .header("Content-Type", JSON_PATCH)
                .send(body.as_slice()),
        };

        let mut response = result.map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(ApiResponse { status, body })
    }

    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, StoreError> {
        let client = self.clone();
        tokio::task::spawn_blocking(move || client.send_blocking(&request))
            .await
            .map_err(|e| StoreError::Transport(format!("request task failed: {}", e)))?
    }

    async fn record_request(
        &self,
        operation: Operation,
        request: ApiRequest,
        namespace: &str,
        name: &str,
    ) -> Result<LockRecord, StoreError> {
        let response = self.execute(request).await?;
        if (200..300).contains(&response.status) {
            wire::decode_record(namespace, &response.body)
        } else {
            Err(wire::classify(operation, response.status, &response.body, namespace, name))
        }
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(value).map_err(|e| StoreError::Decode(e.to_string()))
}

fn pem_certificates(pem: &[u8]) -> Result<Vec<Certificate<'static>>, CredentialError> {
    let mut certs = Vec::new();
    for item in ureq::tls::parse_pem(pem) {
        if let PemItem::Certificate(cert) = item.map_err(|e| CredentialError::Tls(e.to_string()))? {
            certs.push(cert.to_owned());
        }
    }
    if certs.is_empty() {
        return Err(CredentialError::Tls("no PEM certificates found".to_string()));
    }
    Ok(certs)
}

#[async_trait]
impl ObjectStore for KubeClient {
    async fn read(&self, namespace: &str, name: &str) -> Result<LockRecord, StoreError> {
        let request = ApiRequest {
            method: Method::Get,
            path: wire::configmap_path(namespace, name)?,
        };
        self.record_request(Operation::Read, request, namespace, name)
            .await
    }

    async fn create(
        &self,
        namespace: &str,
        name: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        // The name travels in the body, not the path
        wire::validate_name(name)?;
        let request = ApiRequest {
            method: Method::Post(encode(&ConfigMap::new(name, fields))?),
            path: wire::configmaps_path(namespace)?,
        };
        self.record_request(Operation::Create, request, namespace, name)
            .await
    }

    async fn conditional_replace(
        &self,
        namespace: &str,
        name: &str,
        expected: &Version,
        fields: &BTreeMap<String, String>,
    ) -> Result<LockRecord, StoreError> {
        let patch = wire::conditional_replace_patch(expected, fields);
        let request = ApiRequest {
            method: Method::Patch(encode(&patch)?),
            path: wire::configmap_path(namespace, name)?,
        };
        self.record_request(Operation::Patch, request, namespace, name)
            .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
