//! Cold start: new session, one file, one chunk.

use crate::prelude::*;
use confab_client::SyncApi;
use confab_core::{ExternalId, FileKind};
use confab_protocol::{ChunkRequest, InitRequest};

fn init_request(external: &str) -> InitRequest {
    InitRequest {
        external_id: ExternalId::new(external),
        transcript_path: format!("/home/u/.claude/projects/p/{external}.jsonl"),
        cwd: "/home/u/project".to_string(),
        git_info: None,
    }
}

#[tokio::test]
async fn cold_start_single_file_ten_lines() {
    let server = start_server().await;
    let client = sync_client(&server);

    // A brand-new session has no files.
    let init = client.init(&init_request("sess-cold")).await.unwrap();
    assert!(init.files.is_empty());

    // Init is idempotent: same external ID, same internal session.
    let again = client.init(&init_request("sess-cold")).await.unwrap();
    assert_eq!(again.session_id, init.session_id);

    let resp = client
        .upload_chunk(&ChunkRequest {
            session_id: init.session_id.clone(),
            file_name: "sess-cold.jsonl".to_string(),
            file_kind: FileKind::Transcript,
            first_line: 1,
            lines: numbered(0..10),
        })
        .await
        .unwrap();
    assert_eq!(resp.new_cursor, 10);

    // A subsequent init reports the stored cursor.
    let resumed = client.init(&init_request("sess-cold")).await.unwrap();
    assert_eq!(resumed.files["sess-cold.jsonl"].last_synced_line, 10);
}

#[tokio::test]
async fn check_existing_after_cold_start() {
    let server = start_server().await;
    let client = sync_client(&server);
    client.init(&init_request("sess-known")).await.unwrap();

    let resp = client
        .check_existing(&[ExternalId::new("sess-known"), ExternalId::new("sess-new")])
        .await
        .unwrap();
    assert_eq!(resp.existing, vec![ExternalId::new("sess-known")]);
    assert_eq!(resp.missing, vec![ExternalId::new("sess-new")]);
}
