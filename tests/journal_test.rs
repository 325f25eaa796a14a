use chrono::Utc;
use reverie::config::ScoreWeights;
use reverie::embed::HashEmbedder;
use reverie::interest::{InterestTracker, KeywordDetector};
use reverie::journal::writer::write_draft;
use reverie::journal::{Journal, JournalDraft, JournalEntry, symbolic_score};
use std::path::PathBuf;
use std::sync::Arc;

fn tmp_dir(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_nanos();
    let path = std::env::temp_dir().join(format!("reverie-journal-{label}-{nanos}"));
    std::fs::create_dir_all(&path).expect("create temp dir");
    path
}

fn entry(content: &str, style: &str, emotion_tags: &[&str]) -> JournalEntry {
    JournalEntry {
        timestamp: Utc::now(),
        summary: "test".into(),
        topics: Vec::new(),
        style: style.into(),
        emotion_tags: emotion_tags.iter().map(|t| t.to_string()).collect(),
        source: "test".into(),
        content: content.into(),
        vector: Vec::new(),
        symbolic_score: 0.0,
        meta: serde_json::Map::new(),
    }
}

fn poetic_mode(mut e: JournalEntry) -> JournalEntry {
    e.meta
        .insert("poetic_mode".into(), serde_json::Value::Bool(true));
    e
}

// =============================================================
// Symbolic Score Tests
// =============================================================

#[test]
fn blank_entry_scores_zero() {
    let weights = ScoreWeights::default();
    let e = entry("the weather report said rain", "neutral", &[]);
    assert_eq!(symbolic_score(&e, &weights), 0.0);
}

#[test]
fn style_bonuses_are_tiered() {
    let weights = ScoreWeights::default();
    let base = "the weather report said rain";
    let poetic = symbolic_score(&entry(base, "poetic", &[]), &weights);
    let metaphorical = symbolic_score(&entry(base, "metaphorical", &[]), &weights);
    let questioning = symbolic_score(&entry(base, "questioning", &[]), &weights);

    assert_eq!(poetic, 0.3);
    assert_eq!(metaphorical, 0.2);
    assert_eq!(questioning, 0.1);
    assert!(poetic > metaphorical && metaphorical > questioning);
}

#[test]
fn emotion_bonus_is_capped() {
    let weights = ScoreWeights::default();
    let base = "the weather report said rain";
    let one = symbolic_score(&entry(base, "neutral", &["awe"]), &weights);
    let two = symbolic_score(&entry(base, "neutral", &["awe", "calm"]), &weights);
    let five = symbolic_score(
        &entry(base, "neutral", &["awe", "calm", "joy", "fear", "hope"]),
        &weights,
    );

    assert_eq!(one, 0.1);
    assert_eq!(two, 0.2);
    assert_eq!(five, 0.3); // capped, not 0.5
}

#[test]
fn evocative_vocabulary_matches_case_insensitively() {
    let weights = ScoreWeights::default();
    let scored = symbolic_score(&entry("An ECHO across the hall", "neutral", &[]), &weights);
    assert_eq!(scored, 0.2);
}

#[test]
fn self_reference_adds_bonus() {
    let weights = ScoreWeights::default();
    let scored = symbolic_score(
        &entry("that voice belongs to someone", "neutral", &[]),
        &weights,
    );
    assert_eq!(scored, 0.2);
}

#[test]
fn poetic_mode_flag_adds_bonus() {
    let weights = ScoreWeights::default();
    let flagged = poetic_mode(entry("the weather report said rain", "neutral", &[]));
    assert_eq!(symbolic_score(&flagged, &weights), 0.1);
}

#[test]
fn score_is_clamped_to_one() {
    let weights = ScoreWeights::default();
    // style 0.3 + emotions 0.3 + evocative 0.2 + self-ref 0.2 + flag 0.1 = 1.1
    let maxed = poetic_mode(entry(
        "i am an echo of my own memory",
        "poetic",
        &["awe", "calm", "joy"],
    ));
    assert_eq!(symbolic_score(&maxed, &weights), 1.0);
}

#[test]
fn score_is_monotone_in_each_bonus() {
    let weights = ScoreWeights::default();
    let base = entry("the weather report said rain", "neutral", &[]);
    let base_score = symbolic_score(&base, &weights);

    let with_style = entry("the weather report said rain", "questioning", &[]);
    let with_emotion = entry("the weather report said rain", "neutral", &["awe"]);
    let with_flag = poetic_mode(entry("the weather report said rain", "neutral", &[]));

    assert!(symbolic_score(&with_style, &weights) > base_score);
    assert!(symbolic_score(&with_emotion, &weights) > base_score);
    assert!(symbolic_score(&with_flag, &weights) > base_score);
}

#[test]
fn score_is_rounded_to_three_decimals() {
    let mut weights = ScoreWeights::default();
    weights.emotion_step = 0.0333;
    let scored = symbolic_score(&entry("the weather report", "neutral", &["awe"]), &weights);
    assert_eq!(scored, 0.033);
}

// =============================================================
// Journal Store Tests
// =============================================================

#[test]
fn append_derives_the_symbolic_score() {
    let dir = tmp_dir("append");
    let journal = Journal::new(&dir, ScoreWeights::default());

    journal.append(entry("a silence settles in", "poetic", &["calm"]));

    let entries = journal.read_all();
    assert_eq!(entries.len(), 1);
    // style 0.3 + one emotion 0.1 + evocative "silence" 0.2
    assert_eq!(entries[0].symbolic_score, 0.6);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn journal_is_append_only_and_ordered() {
    let dir = tmp_dir("ordered");
    let journal = Journal::new(&dir, ScoreWeights::default());

    journal.append(entry("first thought", "neutral", &[]));
    journal.append(entry("second thought", "neutral", &[]));

    let entries = journal.read_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].content, "first thought");
    assert_eq!(entries[1].content, "second thought");

    std::fs::remove_dir_all(dir).ok();
}

// =============================================================
// Journal Writer Tests
// =============================================================

#[test]
fn write_draft_embeds_and_appends() {
    let dir = tmp_dir("draft");
    let journal = Journal::new(&dir, ScoreWeights::default());
    let interest = InterestTracker::new(&dir, Box::new(KeywordDetector::new(0.02)));
    let embedder = HashEmbedder::default();

    write_draft(
        &journal,
        &interest,
        &embedder,
        JournalDraft {
            summary: "Reflection from poetic layer".into(),
            content: "an echo of the conversation".into(),
            topics: Some(vec!["stars".into()]),
            style: Some("poetic".into()),
            emotion_tags: Vec::new(),
            source: "reflector".into(),
            meta: serde_json::Map::new(),
        },
    );

    let entries = journal.read_all();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].style, "poetic");
    assert_eq!(entries[0].topics, vec!["stars".to_string()]);
    assert_eq!(entries[0].source, "reflector");
    assert!(!entries[0].vector.is_empty());
    assert!(entries[0].symbolic_score > 0.0);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn write_draft_infers_style_from_interest() {
    let dir = tmp_dir("infer");
    let journal = Journal::new(&dir, ScoreWeights::default());
    let interest = InterestTracker::new(&dir, Box::new(KeywordDetector::new(0.02)));
    let embedder = HashEmbedder::default();

    write_draft(
        &journal,
        &interest,
        &embedder,
        JournalDraft {
            summary: "observation".into(),
            content: "it moves like a whisper, as if the silence listens".into(),
            topics: None,
            style: None,
            emotion_tags: Vec::new(),
            source: "reflector".into(),
            meta: serde_json::Map::new(),
        },
    );

    let entries = journal.read_all();
    assert_eq!(entries.len(), 1);
    // The poetic style patterns matched, so its affinity leads.
    assert_eq!(entries[0].style, "poetic");

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn write_draft_without_signal_stays_neutral() {
    let dir = tmp_dir("neutral");
    let journal = Journal::new(&dir, ScoreWeights::default());
    let interest = InterestTracker::new(&dir, Box::new(KeywordDetector::new(0.02)));
    let embedder = HashEmbedder::default();

    write_draft(
        &journal,
        &interest,
        &embedder,
        JournalDraft {
            summary: "observation".into(),
            content: "a plain note".into(),
            topics: None,
            style: None,
            emotion_tags: Vec::new(),
            source: "reflector".into(),
            meta: serde_json::Map::new(),
        },
    );

    let entries = journal.read_all();
    assert_eq!(entries[0].style, "neutral");
    assert!(entries[0].topics.is_empty());

    std::fs::remove_dir_all(dir).ok();
}

#[tokio::test]
async fn spawned_writer_drains_the_queue() {
    use reverie::journal::writer::JournalWriter;

    let dir = tmp_dir("spawned");
    let journal = Arc::new(Journal::new(&dir, ScoreWeights::default()));
    let interest = Arc::new(InterestTracker::new(
        &dir,
        Box::new(KeywordDetector::new(0.02)),
    ));
    let embedder: Arc<dyn reverie::embed::Embedder> = Arc::new(HashEmbedder::default());

    let (sender, handle) = JournalWriter::spawn(journal.clone(), interest, embedder);
    sender.enqueue(JournalDraft {
        summary: "deferred".into(),
        content: "written off the turn path".into(),
        topics: Some(Vec::new()),
        style: Some("neutral".into()),
        emotion_tags: Vec::new(),
        source: "reflector".into(),
        meta: serde_json::Map::new(),
    });
    drop(sender); // close the queue so the worker exits after draining
    handle.await.expect("writer task completes");

    assert_eq!(journal.read_all().len(), 1);

    std::fs::remove_dir_all(dir).ok();
}
