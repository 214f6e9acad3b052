// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use base64::Engine;
use tempfile::TempDir;

const TOKEN_CONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: dev
clusters:
  - name: dev-cluster
    cluster:
      server: https://dev.example.com:6443/
      insecure-skip-tls-verify: true
  - name: prod-cluster
    cluster:
      server: https://prod.example.com
users:
  - name: dev-user
    user:
      token: dev-token
  - name: prod-user
    user:
      username: admin
      password: hunter2
contexts:
  - name: dev
    context:
      cluster: dev-cluster
      user: dev-user
      namespace: ops
  - name: prod
    context:
      cluster: prod-cluster
      user: prod-user
"#;

fn b64(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn current_context_selects_cluster_and_user() {
    let config = Kubeconfig::parse(TOKEN_CONFIG).unwrap();
    let identity = config.identity().unwrap();

    assert_eq!(identity.server, "https://dev.example.com:6443");
    assert_eq!(identity.trust, TrustAnchor::Insecure);
    assert_eq!(identity.auth, Authentication::Bearer("dev-token".to_string()));
    assert_eq!(identity.namespace.as_deref(), Some("ops"));
}

#[test]
fn named_context_with_basic_auth() {
    let config = Kubeconfig::parse(TOKEN_CONFIG).unwrap();
    let identity = config.identity_for("prod").unwrap();

    assert_eq!(identity.server, "https://prod.example.com");
    assert_eq!(identity.trust, TrustAnchor::System);
    assert_eq!(
        identity.auth.authorization().as_deref(),
        Some("Basic YWRtaW46aHVudGVyMg==")
    );
    assert_eq!(identity.namespace, None);
}

#[test]
fn missing_current_context_is_an_error() {
    let config = Kubeconfig::parse("clusters: []\n").unwrap();
    assert!(matches!(
        config.identity(),
        Err(CredentialError::NoCurrentContext)
    ));
}

#[test]
fn dangling_references_are_reported() {
    let config = Kubeconfig::parse(TOKEN_CONFIG).unwrap();
    assert!(matches!(
        config.identity_for("staging"),
        Err(CredentialError::ContextNotFound(name)) if name == "staging"
    ));

    let broken = Kubeconfig::parse(
        "current-context: a\ncontexts:\n  - name: a\n    context:\n      cluster: gone\n",
    )
    .unwrap();
    assert!(matches!(
        broken.identity(),
        Err(CredentialError::ClusterNotFound(name)) if name == "gone"
    ));
}

#[test]
fn inline_certificate_data_is_decoded() {
    let ca = b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";
    let content = format!(
        r#"
current-context: c
clusters:
  - name: k
    cluster:
      server: https://k.example.com
      certificate-authority-data: {ca}
users:
  - name: u
    user:
      client-certificate-data: {cert}
      client-key-data: {key}
contexts:
  - name: c
    context:
      cluster: k
      user: u
"#,
        ca = b64(ca),
        cert = b64(b"CERT"),
        key = b64(b"KEY"),
    );

    let identity = Kubeconfig::parse(&content).unwrap().identity().unwrap();
    assert_eq!(identity.trust, TrustAnchor::Pem(ca.to_vec()));
    assert_eq!(
        identity.auth,
        Authentication::ClientCertificate {
            cert_pem: b"CERT".to_vec(),
            key_pem: b"KEY".to_vec(),
        }
    );
    assert_eq!(identity.auth.authorization(), None);
}

#[test]
fn relative_files_resolve_against_config_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ca.pem"), "CA").unwrap();
    std::fs::write(dir.path().join("token"), "file-token\n").unwrap();
    let path = write_config(
        &dir,
        r#"
current-context: c
clusters:
  - name: k
    cluster:
      server: https://k.example.com
      certificate-authority: ca.pem
users:
  - name: u
    user:
      tokenFile: token
contexts:
  - name: c
    context:
      cluster: k
      user: u
"#,
    );

    let identity = Kubeconfig::load(&path).unwrap().identity().unwrap();
    assert_eq!(identity.trust, TrustAnchor::Pem(b"CA".to_vec()));
    assert_eq!(identity.auth, Authentication::Bearer("file-token".to_string()));
}

#[test]
fn exec_plugins_are_rejected() {
    let content = r#"
current-context: c
clusters:
  - name: k
    cluster:
      server: https://k.example.com
users:
  - name: eks
    user:
      exec:
        apiVersion: client.authentication.k8s.io/v1beta1
        command: aws
contexts:
  - name: c
    context:
      cluster: k
      user: eks
"#;
    let err = Kubeconfig::parse(content).unwrap().identity().unwrap_err();
    assert!(matches!(
        err,
        CredentialError::UnsupportedAuth { kind: "exec", .. }
    ));
}

#[test]
fn certificate_without_key_is_rejected() {
    let content = format!(
        "current-context: c\nclusters:\n  - name: k\n    cluster:\n      server: https://k\nusers:\n  - name: u\n    user:\n      client-certificate-data: {}\ncontexts:\n  - name: c\n    context:\n      cluster: k\n      user: u\n",
        b64(b"CERT")
    );
    assert!(matches!(
        Kubeconfig::parse(&content).unwrap().identity(),
        Err(CredentialError::Tls(_))
    ));
}

#[test]
fn malformed_yaml_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "clusters: [unterminated");

    match Kubeconfig::load(&path) {
        Err(CredentialError::InvalidKubeconfig { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected InvalidKubeconfig, got {:?}", other),
    }
}

#[test]
fn bad_base64_is_reported_with_field() {
    let content = "current-context: c\nclusters:\n  - name: k\n    cluster:\n      server: https://k\n      certificate-authority-data: '!!!'\ncontexts:\n  - name: c\n    context:\n      cluster: k\n";
    assert!(matches!(
        Kubeconfig::parse(content).unwrap().identity(),
        Err(CredentialError::InvalidBase64 {
            field: "certificate-authority-data",
            ..
        })
    ));
}

#[test]
fn secrets_are_redacted_in_debug_output() {
    let identity = Kubeconfig::parse(TOKEN_CONFIG).unwrap().identity().unwrap();
    let debug = format!("{:?}", identity);
    assert!(!debug.contains("dev-token"));
    assert!(debug.contains("redacted"));
}
