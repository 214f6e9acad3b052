// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubeconfig file parsing
//!
//! Covers the subset needed to authenticate against one cluster: the current
//! context, its cluster (server + trust) and its user (token, client
//! certificate, or basic auth). Exec plugins and auth providers are rejected.

use super::credentials::{
    read_to_string, Authentication, ClusterIdentity, CredentialError, TrustAnchor,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Kubeconfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub current_context: Option<String>,
    /// Directory relative file references resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    pub server: String,
    #[serde(default)]
    pub certificate_authority: Option<PathBuf>,
    #[serde(default)]
    pub certificate_authority_data: Option<String>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "tokenFile")]
    pub token_file: Option<PathBuf>,
    #[serde(default)]
    pub client_certificate: Option<PathBuf>,
    #[serde(default)]
    pub client_certificate_data: Option<String>,
    #[serde(default)]
    pub client_key: Option<PathBuf>,
    #[serde(default)]
    pub client_key_data: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub exec: Option<serde_yaml::Value>,
    #[serde(default)]
    pub auth_provider: Option<serde_yaml::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Context {
    pub cluster: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Kubeconfig {
    /// Read and parse a kubeconfig file
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let content = read_to_string(path)?;
        let mut config = Self::parse(&content).map_err(|message| CredentialError::InvalidKubeconfig {
            path: path.to_path_buf(),
            message,
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Identity for the current context
    pub fn identity(&self) -> Result<ClusterIdentity, CredentialError> {
        let context_name = self
            .current_context
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(CredentialError::NoCurrentContext)?;
        self.identity_for(context_name)
    }

    /// Identity for a named context
    pub fn identity_for(&self, context_name: &str) -> Result<ClusterIdentity, CredentialError> {
        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .map(|c| &c.context)
            .ok_or_else(|| CredentialError::ContextNotFound(context_name.to_string()))?;

        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| CredentialError::ClusterNotFound(context.cluster.clone()))?;

        let auth = match context.user.as_deref() {
            Some(user_name) => {
                let user = self
                    .users
                    .iter()
                    .find(|u| u.name == user_name)
                    .map(|u| &u.user)
                    .ok_or_else(|| CredentialError::UserNotFound(user_name.to_string()))?;
                self.authentication(user_name, user)?
            }
            None => Authentication::Anonymous,
        };

        Ok(ClusterIdentity {
            server: cluster.server.trim_end_matches('/').to_string(),
            trust: self.trust(cluster)?,
            auth,
            namespace: context.namespace.clone().filter(|ns| !ns.is_empty()),
        })
    }

    fn trust(&self, cluster: &Cluster) -> Result<TrustAnchor, CredentialError> {
        if cluster.insecure_skip_tls_verify {
            return Ok(TrustAnchor::Insecure);
        }
        if let Some(data) = &cluster.certificate_authority_data {
            return decode_base64("certificate-authority-data", data).map(TrustAnchor::Pem);
        }
        if let Some(path) = &cluster.certificate_authority {
            return self.read_file(path).map(TrustAnchor::Pem);
        }
        Ok(TrustAnchor::System)
    }

    fn authentication(&self, user_name: &str, user: &User) -> Result<Authentication, CredentialError> {
        if user.exec.is_some() {
            return Err(CredentialError::UnsupportedAuth {
                user: user_name.to_string(),
                kind: "exec",
            });
        }
        if user.auth_provider.is_some() {
            return Err(CredentialError::UnsupportedAuth {
                user: user_name.to_string(),
                kind: "auth-provider",
            });
        }

        if let Some(token) = user.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(Authentication::Bearer(token.to_string()));
        }
        if let Some(path) = &user.token_file {
            let token = String::from_utf8_lossy(&self.read_file(path)?).trim().to_string();
            return Ok(Authentication::Bearer(token));
        }

        let cert = match (&user.client_certificate_data, &user.client_certificate) {
            (Some(data), _) => Some(decode_base64("client-certificate-data", data)?),
            (None, Some(path)) => Some(self.read_file(path)?),
            (None, None) => None,
        };
        let key = match (&user.client_key_data, &user.client_key) {
            (Some(data), _) => Some(decode_base64("client-key-data", data)?),
            (None, Some(path)) => Some(self.read_file(path)?),
            (None, None) => None,
        };
        match (cert, key) {
            (Some(cert_pem), Some(key_pem)) => {
                return Ok(Authentication::ClientCertificate { cert_pem, key_pem })
            }
            (None, None) => {}
            _ => {
                return Err(CredentialError::Tls(format!(
                    "user {} needs both a client certificate and a client key",
                    user_name
                )))
            }
        }

        if let (Some(username), Some(password)) = (&user.username, &user.password) {
            return Ok(Authentication::Basic {
                username: username.clone(),
                password: password.clone(),
            });
        }

        Ok(Authentication::Anonymous)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, CredentialError> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        };
        std::fs::read(&resolved).map_err(|e| CredentialError::io(&resolved, e))
    }
}

fn decode_base64(field: &'static str, data: &str) -> Result<Vec<u8>, CredentialError> {
    use base64::Engine;

    let compact: String = data.split_whitespace().collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| CredentialError::InvalidBase64 {
            field,
            message: e.to_string(),
        })
}

#[cfg(test)]
#[path = "kubeconfig_tests.rs"]
mod tests;
