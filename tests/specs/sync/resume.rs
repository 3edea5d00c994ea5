//! Resume: continue an interrupted upload, replay is rejected.

use crate::prelude::*;
use confab_client::{ApiError, SyncApi};
use confab_core::{ExternalId, FileKind};
use confab_protocol::{ChunkRequest, InitRequest};

#[tokio::test]
async fn resume_then_replay_gets_conflict_with_cursor() {
    let server = start_server().await;
    let client = sync_client(&server);

    let init = client
        .init(&InitRequest {
            external_id: ExternalId::new("sess-resume"),
            transcript_path: "/t/sess-resume.jsonl".to_string(),
            cwd: "/t".to_string(),
            git_info: None,
        })
        .await
        .unwrap();

    let chunk = |first_line: u64, lines: Vec<String>| ChunkRequest {
        session_id: init.session_id.clone(),
        file_name: "sess-resume.jsonl".to_string(),
        file_kind: FileKind::Transcript,
        first_line,
        lines,
    };

    client.upload_chunk(&chunk(1, numbered(0..10))).await.unwrap();

    // The file has grown to 25 lines; the client sends the delta.
    let resp = client
        .upload_chunk(&chunk(11, numbered(10..25)))
        .await
        .unwrap();
    assert_eq!(resp.new_cursor, 25);

    // Replaying the same chunk is answered with the stored cursor.
    let err = client
        .upload_chunk(&chunk(11, numbered(10..25)))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::CursorConflict { cursor: 25 }));
}
