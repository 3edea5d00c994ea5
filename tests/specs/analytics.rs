//! Analytics over the wire: upload a transcript, read fresh cards.

use crate::prelude::*;
use confab_client::SyncApi;
use confab_core::{ExternalId, FileKind};
use confab_protocol::{AnalyticsResponse, ChunkRequest, InitRequest};

fn transcript_lines() -> Vec<String> {
    vec![
        r#"{"type":"user","timestamp":"2026-01-30T08:00:00Z","message":{"content":"do it"}}"#
            .to_string(),
        r#"{"type":"assistant","timestamp":"2026-01-30T08:00:05Z","message":{"model":"sonnet-4","usage":{"input_tokens":100,"output_tokens":20},"content":[{"type":"tool_use","name":"Bash","input":{"command":"ls"}}]}}"#
            .to_string(),
        r#"{"type":"assistant","timestamp":"2026-01-30T08:00:30Z","message":{"model":"sonnet-4","usage":{"input_tokens":50,"output_tokens":10},"content":[{"type":"text","text":"done"}]}}"#
            .to_string(),
    ]
}

#[tokio::test]
async fn uploaded_session_serves_current_cards() {
    let server = start_server().await;
    let client = sync_client(&server);

    let init = client
        .init(&InitRequest {
            external_id: ExternalId::new("sess-analytics"),
            transcript_path: "/t/sess-analytics.jsonl".to_string(),
            cwd: "/t".to_string(),
            git_info: None,
        })
        .await
        .unwrap();

    client
        .upload_chunk(&ChunkRequest {
            session_id: init.session_id.clone(),
            file_name: "sess-analytics.jsonl".to_string(),
            file_kind: FileKind::Transcript,
            first_line: 1,
            lines: transcript_lines(),
        })
        .await
        .unwrap();

    let http = reqwest::Client::new();
    let url = format!("{}/sessions/{}/analytics", server.base_url, init.session_id);
    let body: AnalyticsResponse = http
        .get(&url)
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body.computed_lines, 3);
    assert!(body.card_errors.is_none());

    assert_eq!(body.cards["usage"]["input_tokens"], 150);
    assert_eq!(body.cards["usage"]["output_tokens"], 30);
    assert_eq!(body.cards["usage"]["by_model"]["sonnet-4"]["output_tokens"], 30);

    assert_eq!(body.cards["activity"]["commands"], 1);
    assert_eq!(body.cards["activity"]["tool_calls"]["Bash"], 1);

    assert_eq!(body.cards["turns"]["turns"], 2);
    assert_eq!(body.cards["turns"]["user_prompts"], 1);
    assert_eq!(body.cards["turns"]["first_timestamp"], "2026-01-30T08:00:00Z");

    // After more lines arrive, the line-based cards are recomputed.
    client
        .upload_chunk(&ChunkRequest {
            session_id: init.session_id.clone(),
            file_name: "sess-analytics.jsonl".to_string(),
            file_kind: FileKind::Transcript,
            first_line: 4,
            lines: vec![
                r#"{"type":"assistant","timestamp":"2026-01-30T08:01:00Z","message":{"model":"sonnet-4","usage":{"output_tokens":5}}}"#
                    .to_string(),
            ],
        })
        .await
        .unwrap();

    let body: AnalyticsResponse = http
        .get(&url)
        .bearer_auth(API_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.computed_lines, 4);
    assert_eq!(body.cards["usage"]["output_tokens"], 35);
    assert_eq!(body.cards["turns"]["last_timestamp"], "2026-01-30T08:01:00Z");
}
