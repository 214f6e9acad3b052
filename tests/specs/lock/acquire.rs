//! Acquire, release and run specs against a stub API server

use crate::prelude::*;

#[test]
fn acquire_creates_missing_lock() {
    let stub = ApiStub::start(vec![
        (404, not_found("deploy")),
        (201, configmap("deploy", "1", "runner-1")),
    ]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["acquire", "deploy", "--leaser", "runner-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("acquired ci/deploy as runner-1"));

    assert_eq!(
        stub.finish(),
        [
            "GET /api/v1/namespaces/ci/configmaps/deploy",
            "POST /api/v1/namespaces/ci/configmaps",
        ]
    );
}

#[test]
fn acquire_held_lock_exits_3() {
    let stub = ApiStub::start(vec![(200, configmap("deploy", "9", "runner-2"))]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["acquire", "deploy", "--leaser", "runner-1"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("held by runner-2"));

    assert_eq!(stub.finish().len(), 1);
}

#[test]
fn release_frees_own_lock() {
    let stub = ApiStub::start(vec![
        (200, configmap("deploy", "4", "runner-1")),
        (200, configmap("deploy", "5", "false")),
    ]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["release", "deploy", "--leaser", "runner-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("released ci/deploy"));

    assert_eq!(
        stub.finish()[1],
        "PATCH /api/v1/namespaces/ci/configmaps/deploy"
    );
}

#[test]
fn release_of_foreign_lock_fails() {
    let stub = ApiStub::start(vec![(200, configmap("deploy", "4", "runner-2"))]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["release", "deploy", "--leaser", "runner-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("runner-2"));

    stub.finish();
}

#[test]
fn namespace_flag_overrides_kubeconfig() {
    let stub = ApiStub::start(vec![(200, configmap("deploy", "2", "false"))]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["-n", "ops", "status", "deploy"])
        .assert()
        .success();

    assert_eq!(
        stub.finish(),
        ["GET /api/v1/namespaces/ops/configmaps/deploy"]
    );
}

#[cfg(unix)]
#[test]
fn run_executes_command_and_releases() {
    let stub = ApiStub::start(vec![
        (404, not_found("deploy")),
        (201, configmap("deploy", "1", "runner-1")),
        (200, configmap("deploy", "1", "runner-1")),
        (200, configmap("deploy", "2", "false")),
    ]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["run", "deploy", "--leaser", "runner-1", "--", "sh", "-c", "echo ran; exit 5"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("ran"));

    let requests = stub.finish();
    assert_eq!(requests.len(), 4);
    assert!(requests[3].starts_with("PATCH "));
}

#[cfg(unix)]
#[test]
fn run_skips_command_when_held() {
    let stub = ApiStub::start(vec![(200, configmap("deploy", "3", "runner-2"))]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["run", "deploy", "--leaser", "runner-1", "--", "sh", "-c", "echo ran"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("ran").not());

    stub.finish();
}
