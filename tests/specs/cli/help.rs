//! Help and version output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    Sandbox::empty()
        .kubelock()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("acquire"))
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("wait"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn version_prints_package_version() {
    Sandbox::empty()
        .kubelock()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn wait_help_documents_timeout() {
    Sandbox::empty()
        .kubelock()
        .args(["wait", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--timeout"))
        .stdout(predicate::str::contains("--backoff"));
}
