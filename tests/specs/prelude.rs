//! Shared fixtures: an in-process backend and a hermetic home directory.

#![allow(dead_code)]

use confab_analytics::AnalyticsEngine;
use confab_client::{Config, HttpSyncClient};
use confab_server::{build_router, AppState};
use confab_store::SyncStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const API_KEY: &str = "spec-key";

/// An in-process confab-server on an ephemeral port.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<SyncStore>,
    _data_dir: TempDir,
}

pub async fn start_server() -> TestServer {
    let data_dir = TempDir::new().unwrap();
    let store = Arc::new(SyncStore::open(data_dir.path()).unwrap());
    let state = AppState {
        store: Arc::clone(&store),
        engine: AnalyticsEngine::new(),
        api_key: Arc::new(API_KEY.to_string()),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    TestServer {
        base_url: format!("http://{addr}"),
        store,
        _data_dir: data_dir,
    }
}

/// A sync client pointed at a test server.
pub fn sync_client(server: &TestServer) -> HttpSyncClient {
    HttpSyncClient::new(&Config {
        backend_url: server.base_url.clone(),
        api_key: API_KEY.to_string(),
    })
    .unwrap()
}

/// Hermetic `$HOME` for binaries under test.
pub struct TestHome {
    pub dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn confab_dir(&self) -> PathBuf {
        self.path().join(".confab")
    }

    pub fn daemons_dir(&self) -> PathBuf {
        self.confab_dir().join("daemons")
    }

    pub fn state_file(&self, session_id: &str) -> PathBuf {
        self.daemons_dir().join(format!("{session_id}.json"))
    }

    /// Write `config.json` pointing at a test server.
    pub fn write_config(&self, server: &TestServer) {
        std::fs::create_dir_all(self.confab_dir()).unwrap();
        std::fs::write(
            self.confab_dir().join("config.json"),
            serde_json::json!({
                "backend_url": server.base_url,
                "api_key": API_KEY,
            })
            .to_string(),
        )
        .unwrap();
    }
}

/// A `confab` command wired to a hermetic home and a fast tick.
pub fn confab_cmd(home: &TestHome) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("confab").unwrap();
    cmd.env("HOME", home.path())
        .env("CONFAB_TICK_MS", "150")
        .env("CONFAB_DAEMON_BINARY", confabd_path())
        .env_remove("CONFAB_CONFIG_PATH")
        .env_remove("CONFAB_LOG_DIR");
    cmd
}

/// Path to the built `confabd` binary.
pub fn confabd_path() -> PathBuf {
    assert_cmd::cargo::cargo_bin("confabd")
}

/// Append newline-terminated lines to a file.
pub fn append_lines(path: &Path, lines: &[String]) {
    use std::io::Write;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    for line in lines {
        writeln!(f, "{}", line).unwrap();
    }
}

pub fn numbered(range: std::ops::Range<u64>) -> Vec<String> {
    range.map(|i| format!(r#"{{"line":{i}}}"#)).collect()
}

/// Poll until `check` passes or the timeout elapses.
pub async fn wait_for<F: FnMut() -> bool>(mut check: F, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    check()
}
