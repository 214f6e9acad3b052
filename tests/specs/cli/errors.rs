//! Usage and configuration error specs

use crate::prelude::*;

#[test]
fn missing_leaser_is_a_usage_error() {
    Sandbox::empty()
        .kubelock()
        .args(["acquire", "deploy"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--leaser"));
}

#[test]
fn reserved_leaser_is_rejected() {
    Sandbox::empty()
        .kubelock()
        .args(["acquire", "deploy", "--leaser", "false"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("reserved"));
}

#[test]
fn leaser_can_come_from_environment() {
    Sandbox::empty()
        .kubelock()
        .env("KUBELOCK_LEASER", "false")
        .args(["acquire", "deploy"])
        .assert()
        .code(2);
}

#[test]
fn no_credentials_is_reported() {
    if std::path::Path::new(SERVICEACCOUNT_ROOT).join("token").exists() {
        return;
    }
    Sandbox::empty()
        .kubelock()
        .args(["status", "deploy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no authentication source"));
}

#[test]
fn missing_kubeconfig_file_is_an_error() {
    let sandbox = Sandbox::empty();
    sandbox
        .kubelock()
        .env("KUBECONFIG", sandbox.path().join("absent.yaml"))
        .args(["status", "deploy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("absent.yaml"));
}

#[test]
fn exec_auth_is_unsupported() {
    let sandbox = Sandbox::empty();
    let path = sandbox.file(
        "exec.yaml",
        "current-context: c\nclusters:\n  - name: k\n    cluster:\n      server: https://k\nusers:\n  - name: u\n    user:\n      exec:\n        command: aws\ncontexts:\n  - name: c\n    context:\n      cluster: k\n      user: u\n",
    );
    sandbox
        .kubelock()
        .env("KUBECONFIG", path)
        .args(["status", "deploy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("exec"));
}

#[test]
fn unreachable_server_fails() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    Sandbox::with_server(&format!("http://{}", addr))
        .kubelock()
        .args(["status", "deploy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read ci/deploy"));
}
