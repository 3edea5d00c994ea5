// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use confab_core::FileKind;
use confab_transcript::FileLines;

fn assistant_line(model: &str, input: u64, output: u64) -> String {
    format!(
        r#"{{"type":"assistant","message":{{"model":"{model}","usage":{{"input_tokens":{input},"output_tokens":{output}}}}}}}"#
    )
}

#[test]
fn sums_usage_across_files() {
    let files = FileCollection::new(
        FileLines::new(
            "s.jsonl",
            FileKind::Transcript,
            vec![
                r#"{"type":"user"}"#.to_string(),
                assistant_line("sonnet-4", 100, 10),
                assistant_line("sonnet-4", 50, 5),
            ],
        ),
        vec![FileLines::new(
            "agent-a.jsonl",
            FileKind::Sidechain,
            vec![assistant_line("haiku-3", 20, 2)],
        )],
    );

    let payload = UsageAnalyzer.analyze(&files).unwrap();
    assert_eq!(payload["input_tokens"], 170);
    assert_eq!(payload["output_tokens"], 17);
    assert_eq!(payload["assistant_messages"], 3);
    assert_eq!(payload["by_model"]["sonnet-4"]["input_tokens"], 150);
    assert_eq!(payload["by_model"]["haiku-3"]["output_tokens"], 2);
}

#[test]
fn empty_collection_yields_zero_card() {
    let files = FileCollection::new(
        FileLines::new("s.jsonl", FileKind::Transcript, vec![]),
        vec![],
    );
    let payload = UsageAnalyzer.analyze(&files).unwrap();
    assert_eq!(payload["input_tokens"], 0);
    assert_eq!(payload["assistant_messages"], 0);
}

#[test]
fn assistant_without_usage_still_counts_message() {
    let files = FileCollection::new(
        FileLines::new(
            "s.jsonl",
            FileKind::Transcript,
            vec![r#"{"type":"assistant","message":{"content":[]}}"#.to_string()],
        ),
        vec![],
    );
    let payload = UsageAnalyzer.analyze(&files).unwrap();
    assert_eq!(payload["assistant_messages"], 1);
    assert_eq!(payload["output_tokens"], 0);
}
