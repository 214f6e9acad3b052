// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ConfigMap wire format and status mapping

use kubelock_core::{LockRecord, StoreError, Version};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

pub const JSON: &str = "application/json";
pub const JSON_PATCH: &str = "application/json-patch+json";

const MAX_NAMESPACE_LEN: usize = 63;
const MAX_NAME_LEN: usize = 253;

// RFC 1123 label: namespaces
#[allow(clippy::expect_used)]
static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("constant regex pattern is valid")
});

// RFC 1123 subdomain: object names
#[allow(clippy::expect_used)]
static DNS_SUBDOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("constant regex pattern is valid")
});

fn check(
    kind: &'static str,
    value: &str,
    pattern: &Regex,
    max_len: usize,
    rule: &'static str,
) -> Result<(), StoreError> {
    if value.len() <= max_len && pattern.is_match(value) {
        Ok(())
    } else {
        Err(StoreError::InvalidName {
            kind,
            value: value.to_string(),
            rule,
        })
    }
}

/// Namespaces are DNS labels
pub fn validate_namespace(namespace: &str) -> Result<(), StoreError> {
    check(
        "namespace",
        namespace,
        &DNS_LABEL,
        MAX_NAMESPACE_LEN,
        "must be at most 63 lowercase alphanumerics or '-', starting and ending alphanumeric",
    )
}

/// ConfigMap names are DNS subdomains
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    check(
        "configmap name",
        name,
        &DNS_SUBDOMAIN,
        MAX_NAME_LEN,
        "must be at most 253 lowercase alphanumerics, '-' or '.', with each '.'-separated part starting and ending alphanumeric",
    )
}

/// Path of a single ConfigMap; both segments are validated first
pub fn configmap_path(namespace: &str, name: &str) -> Result<String, StoreError> {
    validate_namespace(namespace)?;
    validate_name(name)?;
    Ok(format!("/api/v1/namespaces/{}/configmaps/{}", namespace, name))
}

/// Path of the ConfigMap collection in a namespace
pub fn configmaps_path(namespace: &str) -> Result<String, StoreError> {
    validate_namespace(namespace)?;
    Ok(format!("/api/v1/namespaces/{}/configmaps", namespace))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: Option<BTreeMap<String, String>>,
}

impl ConfigMap {
    pub fn new(name: &str, data: &BTreeMap<String, String>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "ConfigMap".to_string(),
            metadata: ObjectMeta {
                name: name.to_string(),
                ..ObjectMeta::default()
            },
            data: Some(data.clone()),
        }
    }

    pub fn into_record(self, namespace: &str) -> Result<LockRecord, StoreError> {
        let version = self.metadata.resource_version.ok_or_else(|| {
            StoreError::Decode(format!(
                "configmap {}/{} has no resourceVersion",
                namespace, self.metadata.name
            ))
        })?;
        Ok(LockRecord {
            namespace: self.metadata.namespace.unwrap_or_else(|| namespace.to_string()),
            name: self.metadata.name,
            version: Version(version),
            fields: self.data.unwrap_or_default(),
        })
    }
}

/// Kubernetes `Status` body returned with failed requests
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// One JSON-patch operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Replace { path: String, value: String },
}

/// Escape a JSON pointer reference token (RFC 6901)
pub fn escape_pointer(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Field replacements followed by the resourceVersion precondition
pub fn conditional_replace_patch(expected: &Version, fields: &BTreeMap<String, String>) -> Vec<PatchOp> {
    fields
        .iter()
        .map(|(key, value)| PatchOp::Replace {
            path: format!("/data/{}", escape_pointer(key)),
            value: value.clone(),
        })
        .chain(std::iter::once(PatchOp::Replace {
            path: "/metadata/resourceVersion".to_string(),
            value: expected.as_str().to_string(),
        }))
        .collect()
}

/// Which request a failed response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Patch,
}

/// Map a non-2xx response to a store error
pub fn classify(operation: Operation, status: u16, body: &str, namespace: &str, name: &str) -> StoreError {
    let parsed: Status = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .clone()
        .unwrap_or_else(|| body.trim().to_string());

    match (status, operation) {
        (404, _) => StoreError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        (409, Operation::Create) => StoreError::AlreadyExists {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        (409, _) => StoreError::Conflict {
            namespace: namespace.to_string(),
            name: name.to_string(),
            message,
        },
        (429, _) => StoreError::RateLimited(message),
        _ => StoreError::Api {
            status,
            reason: parsed.reason,
            message,
        },
    }
}

/// Decode a successful ConfigMap response
pub fn decode_record(namespace: &str, body: &str) -> Result<LockRecord, StoreError> {
    let configmap: ConfigMap =
        serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))?;
    configmap.into_record(namespace)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
