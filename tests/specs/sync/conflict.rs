//! Cursor conflict: another writer advanced the server; the daemon adopts
//! the server's cursor and converges on the file contents.

use crate::prelude::*;
use confab_client::SyncApi;
use confab_core::{ExternalId, FileKind};
use confab_daemon::{SpawnContext, SyncDaemon};
use confab_protocol::ChunkRequest;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn conflict_recovery_converges_with_disk() {
    let server = start_server().await;
    let dir = TempDir::new().unwrap();
    let transcript = dir.path().join("sess-conflict.jsonl");
    append_lines(&transcript, &numbered(0..20));

    let ctx = SpawnContext {
        external_id: ExternalId::new("sess-conflict"),
        transcript_path: transcript.clone(),
        cwd: dir.path().to_path_buf(),
        host_pid: None,
    };
    let api = Arc::new(sync_client(&server));
    let mut daemon = SyncDaemon::init(Arc::clone(&api), &ctx, None).await.unwrap();
    daemon.tick().await.unwrap();

    // Another path (e.g. a backfill run) uploads lines 21..25 directly.
    append_lines(&transcript, &numbered(20..30));
    api.upload_chunk(&ChunkRequest {
        session_id: daemon.session_id().clone(),
        file_name: "sess-conflict.jsonl".to_string(),
        file_kind: FileKind::Transcript,
        first_line: 21,
        lines: numbered(20..25),
    })
    .await
    .unwrap();

    // The daemon still believes 20 and collides at first_line=21.
    let report = daemon.tick().await.unwrap();
    assert_eq!(report.conflicts, 1);

    // The next tick re-tails from the server's cursor and uploads the rest.
    let report = daemon.tick().await.unwrap();
    assert_eq!(report.uploaded_lines, 5);

    // Final stored content matches the file on disk exactly.
    let files = server.store.collect_files(daemon.session_id()).unwrap();
    assert_eq!(files.primary.lines, numbered(0..30));
}
