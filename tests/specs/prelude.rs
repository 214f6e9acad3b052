//! Shared helpers for CLI specs

#![allow(dead_code)]

pub use assert_cmd::Command;
pub use predicates::prelude::*;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tempfile::TempDir;

pub const SERVICEACCOUNT_ROOT: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Path of the `kubelock` binary under test.
///
/// The binary lives in another workspace package, so cargo does not export
/// `CARGO_BIN_EXE_kubelock` here. `KUBELOCK_BIN` overrides the lookup;
/// otherwise the binary is taken from the profile directory this test
/// executable was built into (`target/<profile>/deps/specs-*`), building it
/// there first if needed.
pub fn kubelock_bin() -> &'static Path {
    static BIN: OnceLock<PathBuf> = OnceLock::new();
    BIN.get_or_init(|| {
        if let Some(path) = std::env::var_os("KUBELOCK_BIN") {
            return PathBuf::from(path);
        }

        let exe = std::env::current_exe().unwrap();
        let mut profile_dir = exe.parent().unwrap().to_path_buf();
        if profile_dir.ends_with("deps") {
            profile_dir.pop();
        }
        let bin = profile_dir.join(format!("kubelock{}", std::env::consts::EXE_SUFFIX));
        if !bin.exists() {
            build_kubelock(&profile_dir);
        }
        assert!(bin.exists(), "kubelock binary not found at {}", bin.display());
        bin
    })
}

/// Build the CLI into the same target directory and profile as the specs
fn build_kubelock(profile_dir: &Path) {
    let target_dir = profile_dir.parent().unwrap();
    let cargo = std::env::var_os("CARGO").unwrap_or_else(|| "cargo".into());
    let mut build = std::process::Command::new(cargo);
    build
        .args(["build", "--quiet", "-p", "kubelock", "--bin", "kubelock"])
        .arg("--target-dir")
        .arg(target_dir)
        .current_dir(env!("CARGO_MANIFEST_DIR"));
    if profile_dir.file_name().is_some_and(|name| name == "release") {
        build.arg("--release");
    }
    let status = build.status().unwrap();
    assert!(status.success(), "cargo build -p kubelock failed: {}", status);
}

/// Isolated environment: empty home, no KUBECONFIG, no in-cluster env
pub struct Sandbox {
    dir: TempDir,
    kubeconfig: Option<PathBuf>,
}

impl Sandbox {
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("home")).unwrap();
        Self {
            dir,
            kubeconfig: None,
        }
    }

    /// Sandbox whose KUBECONFIG points at `server` with a bearer token
    pub fn with_server(server: &str) -> Self {
        let mut sandbox = Self::empty();
        let path = sandbox.dir.path().join("kubeconfig.yaml");
        std::fs::write(
            &path,
            format!(
                "current-context: test\nclusters:\n  - name: test\n    cluster:\n      server: {}\nusers:\n  - name: test\n    user:\n      token: sandbox-token\ncontexts:\n  - name: test\n    context:\n      cluster: test\n      user: test\n      namespace: ci\n",
                server
            ),
        )
        .unwrap();
        sandbox.kubeconfig = Some(path);
        sandbox
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// `kubelock` command running inside this sandbox
    pub fn kubelock(&self) -> Command {
        let mut cmd = Command::new(kubelock_bin());
        cmd.env("HOME", self.dir.path().join("home"))
            .env_remove("KUBECONFIG")
            .env_remove("KUBELOCK_NAMESPACE")
            .env_remove("KUBELOCK_LEASER")
            .env_remove("KUBERNETES_SERVICE_HOST")
            .env_remove("KUBERNETES_SERVICE_PORT")
            .env_remove("RUST_LOG")
            .env("KUBELOCK_RETRY_INTERVAL_MS", "1")
            .env("KUBELOCK_TIMEOUT_REQUEST_MS", "5000");
        if let Some(path) = &self.kubeconfig {
            cmd.env("KUBECONFIG", path);
        }
        cmd
    }
}

/// Recorded request line, e.g. `GET /api/v1/namespaces/ci/configmaps/deploy`
pub type RequestLine = String;

/// Loopback API server replying to each connection with the next canned response
pub struct ApiStub {
    pub url: String,
    requests: Arc<Mutex<Vec<RequestLine>>>,
    handle: std::thread::JoinHandle<()>,
}

impl ApiStub {
    pub fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&requests);

        let handle = std::thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                sink.lock().unwrap().push(read_request_line(&mut reader));

                let response = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(response.as_bytes()).unwrap();
            }
        });

        Self {
            url,
            requests,
            handle,
        }
    }

    /// Wait for every canned response to be served
    pub fn finish(self) -> Vec<RequestLine> {
        self.handle.join().unwrap();
        let requests = self.requests.lock().unwrap();
        requests.clone()
    }
}

fn read_request_line(reader: &mut BufReader<std::net::TcpStream>) -> RequestLine {
    let mut first = String::new();
    reader.read_line(&mut first).unwrap();

    let mut length = 0;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).unwrap();
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0; length];
    reader.read_exact(&mut body).unwrap();

    let mut parts = first.split_whitespace();
    format!(
        "{} {}",
        parts.next().unwrap_or_default(),
        parts.next().unwrap_or_default()
    )
}

/// ConfigMap body for `ci/<name>` with the given `locked` value
pub fn configmap(name: &str, version: &str, locked: &str) -> String {
    format!(
        r#"{{"apiVersion":"v1","kind":"ConfigMap","metadata":{{"name":"{}","namespace":"ci","resourceVersion":"{}"}},"data":{{"locked":"{}"}}}}"#,
        name, version, locked
    )
}

pub fn not_found(name: &str) -> String {
    format!(
        r#"{{"kind":"Status","status":"Failure","reason":"NotFound","message":"configmaps \"{}\" not found","code":404}}"#,
        name
    )
}
