//! Hook robustness: the host agent always gets a well-formed response and a
//! zero exit code, no matter what.

use crate::prelude::*;

fn assert_hook_contract(stdout: &[u8]) {
    let text = String::from_utf8_lossy(stdout);
    let json: serde_json::Value =
        serde_json::from_str(text.trim()).expect("stdout must be exactly one JSON object");
    assert_eq!(json["continue"], true);
    assert_eq!(json["suppressOutput"], true);
    assert!(json["stopReason"].is_string());
}

#[tokio::test]
async fn start_hook_with_garbage_stdin_still_answers() {
    let home = TestHome::new();
    let output = confab_cmd(&home)
        .args(["hook", "start"])
        .write_stdin("this is not json")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_hook_contract(&output.stdout);
}

#[tokio::test]
async fn start_hook_with_empty_stdin_still_answers() {
    let home = TestHome::new();
    let output = confab_cmd(&home)
        .args(["hook", "start"])
        .write_stdin("")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_hook_contract(&output.stdout);
}

#[tokio::test]
async fn stop_hook_without_a_daemon_still_answers() {
    let home = TestHome::new();
    let output = confab_cmd(&home)
        .args(["hook", "stop"])
        .write_stdin(r#"{"session_id":"no-such-session","transcript_path":"/t","cwd":"/"}"#)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_hook_contract(&output.stdout);
}

#[tokio::test]
async fn start_hook_without_backend_config_answers_and_leaves_no_state() {
    let home = TestHome::new();
    let transcript = home.path().join("transcripts").join("sess-nocfg.jsonl");
    append_lines(&transcript, &numbered(0..3));

    let input = serde_json::json!({
        "session_id": "sess-nocfg",
        "transcript_path": transcript,
        "cwd": home.path(),
        "reason": "SessionStart",
    });
    let output = confab_cmd(&home)
        .args(["hook", "start"])
        .write_stdin(input.to_string())
        .output()
        .unwrap();

    // No config: the daemon exits during init, but the host is unaffected.
    assert!(output.status.success());
    assert_hook_contract(&output.stdout);

    // The failed daemon cleans up its state file.
    let state_file = home.state_file("sess-nocfg");
    assert!(
        wait_for(|| !state_file.exists(), std::time::Duration::from_secs(10)).await,
        "state file should be removed after failed init"
    );
}
