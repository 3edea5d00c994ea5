// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::*;
use confab_core::{ExternalId, FileKind, SessionId};

#[test]
fn init_request_omits_absent_git_info() {
    let req = InitRequest {
        external_id: ExternalId::new("ext-1"),
        transcript_path: "/tmp/ext-1.jsonl".to_string(),
        cwd: "/tmp".to_string(),
        git_info: None,
    };
    let json = serde_json::to_value(&req).unwrap();
    assert!(json.get("git_info").is_none());
}

#[test]
fn chunk_request_shape() {
    let json = serde_json::json!({
        "session_id": "s-1",
        "file_name": "ext-1.jsonl",
        "file_kind": "transcript",
        "first_line": 11,
        "lines": ["a", "b"],
    });
    let req: ChunkRequest = serde_json::from_value(json).unwrap();
    assert_eq!(req.session_id, SessionId::new("s-1"));
    assert_eq!(req.file_kind, FileKind::Transcript);
    assert_eq!(req.first_line, 11);
    assert_eq!(req.lines.len(), 2);
}

#[test]
fn init_response_tolerates_missing_files_map() {
    let resp: InitResponse = serde_json::from_str(r#"{"session_id":"s-1"}"#).unwrap();
    assert!(resp.files.is_empty());
}

#[test]
fn cursor_conflict_body() {
    let body = ErrorBody::cursor_conflict(25);
    assert_eq!(body.code, error_code::CURSOR_CONFLICT);
    assert_eq!(body.cursor, Some(25));
    assert_eq!(body.error, "first_line must be 26");

    let json = serde_json::to_string(&body).unwrap();
    let back: ErrorBody = serde_json::from_str(&json).unwrap();
    assert_eq!(back, body);
}

#[test]
fn plain_error_body_omits_cursor() {
    let body = ErrorBody::new(error_code::NOT_FOUND, "no such session");
    let json = serde_json::to_value(&body).unwrap();
    assert!(json.get("cursor").is_none());
}

#[test]
fn analytics_response_omits_empty_errors() {
    let resp = AnalyticsResponse {
        computed_at: "2026-02-01T00:00:00Z".to_string(),
        computed_lines: 12,
        cards: Default::default(),
        card_errors: None,
    };
    let json = serde_json::to_value(&resp).unwrap();
    assert!(json.get("card_errors").is_none());
}
