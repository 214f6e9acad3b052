//! Status output specs

use crate::prelude::*;

#[test]
fn status_reports_holder() {
    let stub = ApiStub::start(vec![(200, configmap("deploy", "7", "runner-9"))]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["status", "deploy"])
        .assert()
        .success()
        .stdout("ci/deploy: held by runner-9\n");

    stub.finish();
}

#[test]
fn status_json_for_absent_lock() {
    let stub = ApiStub::start(vec![(404, not_found("deploy"))]);

    let output = Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["status", "deploy", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains(r#""state": "absent""#), "stdout: {}", text);
    assert!(text.contains(r#""namespace": "ci""#), "stdout: {}", text);
    stub.finish();
}

#[test]
fn status_with_foreign_configmap_is_unmanaged() {
    let stub = ApiStub::start(vec![(
        200,
        r#"{"metadata":{"name":"settings","namespace":"ci","resourceVersion":"3"},"data":{"mode":"fast"}}"#.to_string(),
    )]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["status", "settings"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unmanaged"));

    stub.finish();
}

#[test]
fn status_rejects_name_that_is_not_a_subdomain() {
    let stub = ApiStub::start(vec![]);

    Sandbox::with_server(&stub.url)
        .kubelock()
        .args(["status", "deploy?dryRun=All"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid configmap name"));

    assert!(stub.finish().is_empty());
}
