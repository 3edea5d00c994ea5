//! A sidechain file appearing mid-session is synced from the next tick.

use crate::prelude::*;
use confab_client::SyncApi;
use confab_core::ExternalId;
use confab_daemon::{SpawnContext, SyncDaemon};
use confab_protocol::InitRequest;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn sidechain_appearing_between_ticks_is_uploaded() {
    let server = start_server().await;
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("sess-side.jsonl");
    append_lines(&transcript, &numbered(0..50));

    let ctx = SpawnContext {
        external_id: ExternalId::new("sess-side"),
        transcript_path: transcript.clone(),
        cwd: dir.path().to_path_buf(),
        host_pid: None,
    };
    let api = Arc::new(sync_client(&server));
    let mut daemon = SyncDaemon::init(Arc::clone(&api), &ctx, None).await.unwrap();

    let report = daemon.tick().await.unwrap();
    assert_eq!(report.uploaded_lines, 50);

    // Sidechain appears after the first tick, with three lines.
    append_lines(&dir.path().join("agent-sub1.jsonl"), &numbered(0..3));

    let report = daemon.tick().await.unwrap();
    assert_eq!(report.uploaded_lines, 3);

    // The server now tracks both files.
    let resumed = api
        .init(&InitRequest {
            external_id: ExternalId::new("sess-side"),
            transcript_path: transcript.display().to_string(),
            cwd: dir.path().display().to_string(),
            git_info: None,
        })
        .await
        .unwrap();
    assert_eq!(resumed.files["sess-side.jsonl"].last_synced_line, 50);
    assert_eq!(resumed.files["agent-sub1.jsonl"].last_synced_line, 3);
}
