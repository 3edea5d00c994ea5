//! Full daemon lifecycle: hook start → background sync → hook stop with a
//! final flush, leaving no state behind.

use crate::prelude::*;
use confab_core::ExternalId;
use std::time::Duration;

const SESSION: &str = "sess-e2e";

fn cursor_of(server: &TestServer, file: &str) -> u64 {
    let Some(record) = server.store.session_by_external(&ExternalId::new(SESSION)) else {
        return 0;
    };
    server
        .store
        .file_cursors(&record.id)
        .ok()
        .and_then(|files| files.get(file).map(|c| c.last_synced_line))
        .unwrap_or(0)
}

#[tokio::test(flavor = "multi_thread")]
async fn start_sync_grow_stop_final_flush() {
    let server = start_server().await;
    let home = TestHome::new();
    home.write_config(&server);

    let transcript = home.path().join("transcripts").join(format!("{SESSION}.jsonl"));
    append_lines(&transcript, &numbered(0..5));

    // Session start hook: spawns the detached daemon.
    let input = serde_json::json!({
        "session_id": SESSION,
        "transcript_path": transcript,
        "cwd": home.path(),
        "reason": "SessionStart",
    });
    let output = confab_cmd(&home)
        .args(["hook", "start"])
        .write_stdin(input.to_string())
        .output()
        .unwrap();
    assert!(output.status.success());

    // The daemon's state file exists and the initial flush lands.
    let state_file = home.state_file(SESSION);
    assert!(
        wait_for(|| state_file.exists(), Duration::from_secs(10)).await,
        "daemon state file should appear"
    );
    let file_name = format!("{SESSION}.jsonl");
    assert!(
        wait_for(|| cursor_of(&server, &file_name) == 5, Duration::from_secs(10)).await,
        "initial flush should sync 5 lines, got {}",
        cursor_of(&server, &file_name)
    );

    // Growth between ticks is picked up.
    append_lines(&transcript, &numbered(5..8));
    assert!(
        wait_for(|| cursor_of(&server, &file_name) == 8, Duration::from_secs(10)).await,
        "appended lines should sync, got {}",
        cursor_of(&server, &file_name)
    );

    // A second start hook while the daemon is live must not spawn another.
    let output = confab_cmd(&home)
        .args(["hook", "start"])
        .write_stdin(input.to_string())
        .output()
        .unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("already running"),
        "second start should detect the live daemon: {stderr}"
    );

    // Grow the file, then stop: the final flush must cover the new lines.
    append_lines(&transcript, &numbered(8..10));
    let output = confab_cmd(&home)
        .args(["hook", "stop"])
        .write_stdin(input.to_string())
        .output()
        .unwrap();
    assert!(output.status.success());

    assert!(
        wait_for(|| cursor_of(&server, &file_name) == 10, Duration::from_secs(10)).await,
        "final flush should sync trailing lines, got {}",
        cursor_of(&server, &file_name)
    );
    assert!(
        wait_for(|| !state_file.exists(), Duration::from_secs(10)).await,
        "daemon should remove its state file on clean exit"
    );

    // Stored content matches the file on disk.
    let record = server
        .store
        .session_by_external(&ExternalId::new(SESSION))
        .unwrap();
    let files = server.store.collect_files(&record.id).unwrap();
    assert_eq!(files.primary.lines, numbered(0..10));
}
