use reverie::memory::{Compactor, DialogueLog};
use std::path::PathBuf;

fn tmp_dir(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("reverie-memory-{label}-{nanos}"));
    std::fs::create_dir_all(&path).expect("create temp dir");
    path
}

// =============================================================
// Dialogue Log Tests
// =============================================================

#[test]
fn record_appends_dialogue_entries_in_order() {
    let dir = tmp_dir("record");
    let log = DialogueLog::new(&dir);

    log.record("hello", "hi there", &[], None);
    log.record("how are you", "thinking of stars", &[], Some("smalltalk"));

    let entries = log.read_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].user_text, "hello");
    assert_eq!(entries[0].agent_text, "hi there");
    assert_eq!(entries[0].topic, "");
    assert_eq!(entries[1].topic, "smalltalk");
    assert_eq!(entries[0].id.len(), 8);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn record_with_emotion_tags_writes_snapshot() {
    let dir = tmp_dir("emotion");
    let log = DialogueLog::new(&dir);

    log.record("sad news", "I am here", &["sadness".into(), "warmth".into()], None);
    log.record("plain turn", "ok", &[], None);

    let snapshots = log.read_emotions();
    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].tags.get("sadness"), Some(&1.0));
    assert_eq!(snapshots[0].tags.get("warmth"), Some(&1.0));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn malformed_dialogue_line_is_skipped() {
    let dir = tmp_dir("malformed");
    let log = DialogueLog::new(&dir);
    log.record("first", "reply one", &[], None);

    // Corrupt the log with a half-written line, then keep appending.
    let path = dir.join("dialogue_log.jsonl");
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{\"id\": \"trunc\n");
    std::fs::write(&path, content).unwrap();
    log.record("second", "reply two", &[], None);

    let entries = log.read_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].user_text, "second");

    std::fs::remove_dir_all(dir).ok();
}

// =============================================================
// Compaction Tests
// =============================================================

#[test]
fn compaction_keeps_recent_turns_within_budget() {
    let dir = tmp_dir("budget");
    let log = DialogueLog::new(&dir);
    let compactor = Compactor::new(&dir);

    log.record("aaaa", "bbbb", &[], None); // 8 chars, oldest
    log.record("cccc", "dddd", &[], None); // 8 chars
    log.record("eeee", "ffff", &[], None); // 8 chars, newest

    // Budget fits exactly two turns.
    let report = compactor.compact(&log, 16);
    assert_eq!(report.kept_turns, 2);
    assert_eq!(report.archived, 1);

    let window = compactor.short_term();
    assert_eq!(window.len(), 4);
    // Chronological order, user before assistant per turn.
    assert_eq!(window[0].role, "user");
    assert_eq!(window[0].content, "cccc");
    assert_eq!(window[1].role, "assistant");
    assert_eq!(window[1].content, "dddd");
    assert_eq!(window[2].content, "eeee");
    assert_eq!(window[3].content, "ffff");

    let archive = compactor.long_term();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].content, "aaaa / bbbb");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn compaction_is_a_complete_partition() {
    let dir = tmp_dir("partition");
    let log = DialogueLog::new(&dir);
    let compactor = Compactor::new(&dir);

    for i in 0..10 {
        log.record(&format!("user message {i}"), &format!("agent reply {i}"), &[], None);
    }

    let report = compactor.compact(&log, 100);
    assert_eq!(report.kept_turns + report.archived, 10);

    // Short-term character sum never exceeds the budget.
    let window_chars: usize = compactor
        .short_term()
        .iter()
        .map(|m| m.content.chars().count())
        .sum();
    assert!(window_chars <= 100);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn oversized_single_entry_goes_straight_to_archive() {
    let dir = tmp_dir("oversized");
    let log = DialogueLog::new(&dir);
    let compactor = Compactor::new(&dir);

    let long_user = "u".repeat(300);
    let long_agent = "a".repeat(300);
    log.record(&long_user, &long_agent, &[], None);

    let report = compactor.compact(&log, 100);
    assert_eq!(report.kept_turns, 0);
    assert_eq!(report.archived, 1);

    assert!(compactor.short_term().is_empty());
    let archive = compactor.long_term();
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].content, format!("{long_user} / {long_agent}"));

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn first_overflowing_turn_archives_everything_older() {
    let dir = tmp_dir("cliff");
    let log = DialogueLog::new(&dir);
    let compactor = Compactor::new(&dir);

    log.record("tiny", "turn", &[], None); // 8 chars, oldest: would fit alone
    log.record(&"x".repeat(50), &"y".repeat(50), &[], None); // 100 chars
    log.record("abcd", "efgh", &[], None); // 8 chars, newest

    // Newest (8) fits; the 100-char turn overflows; the tiny oldest turn
    // is archived with it even though it would still fit.
    let report = compactor.compact(&log, 20);
    assert_eq!(report.kept_turns, 1);
    assert_eq!(report.archived, 2);

    let archive = compactor.long_term();
    assert_eq!(archive[0].content, "tiny / turn");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn recompaction_does_not_duplicate_archive_items() {
    let dir = tmp_dir("rerun");
    let log = DialogueLog::new(&dir);
    let compactor = Compactor::new(&dir);

    log.record(&"o".repeat(100), &"o".repeat(100), &[], None);
    log.record("keep", "this", &[], None);

    compactor.compact(&log, 50);
    compactor.compact(&log, 50);
    compactor.compact(&log, 50);

    assert_eq!(compactor.long_term().len(), 1);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn short_term_snapshot_is_overwritten_wholesale() {
    let dir = tmp_dir("overwrite");
    let log = DialogueLog::new(&dir);
    let compactor = Compactor::new(&dir);

    log.record("first", "reply", &[], None);
    compactor.compact(&log, 1000);
    assert_eq!(compactor.short_term().len(), 2);

    log.record("second", "reply", &[], None);
    compactor.compact(&log, 1000);
    let window = compactor.short_term();
    assert_eq!(window.len(), 4);
    assert_eq!(window[0].content, "first");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn empty_log_compacts_to_empty_stores() {
    let dir = tmp_dir("empty");
    let log = DialogueLog::new(&dir);
    let compactor = Compactor::new(&dir);

    let report = compactor.compact(&log, 2000);
    assert_eq!(report.kept_turns, 0);
    assert_eq!(report.archived, 0);
    assert!(compactor.short_term().is_empty());
    assert!(compactor.long_term().is_empty());

    std::fs::remove_dir_all(dir).ok();
}
