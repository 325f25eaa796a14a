//! The symbolic journal: the agent's own reflections, scored for salience.
//!
//! Entries are append-only and never mutated after write. Each carries a
//! `symbolic_score` in [0,1] derived from its style, emotion tags,
//! vocabulary, self-reference and poetic-mode flag; the score later gates
//! which entries the symbolic reflector may resurface.

pub mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

use crate::config::ScoreWeights;
use crate::store::JsonlStore;

/// One journal record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub emotion_tags: Vec<String>,
    #[serde(default)]
    pub source: String,
    pub content: String,
    #[serde(default)]
    pub vector: Vec<f32>,
    #[serde(default)]
    pub symbolic_score: f32,
    #[serde(default)]
    pub meta: serde_json::Map<String, Value>,
}

fn default_style() -> String {
    "neutral".into()
}

impl JournalEntry {
    /// Whether the entry was written in poetic mode.
    pub fn poetic_mode(&self) -> bool {
        self.meta.get("poetic_mode").map(is_truthy).unwrap_or(false)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// A reflection waiting to be materialized into the journal. Fields left
/// `None` are inferred by the writer from the interest profile.
#[derive(Debug, Clone)]
pub struct JournalDraft {
    pub summary: String,
    pub content: String,
    pub topics: Option<Vec<String>>,
    pub style: Option<String>,
    pub emotion_tags: Vec<String>,
    pub source: String,
    pub meta: serde_json::Map<String, Value>,
}

/// Heuristic salience of a journal entry, in [0,1].
///
/// Sum of independent bonuses (style, emotion-tag count, evocative
/// vocabulary, self-reference, poetic-mode flag), clamped and rounded to
/// three decimals. Deterministic: the same entry always scores the same.
pub fn symbolic_score(entry: &JournalEntry, weights: &ScoreWeights) -> f32 {
    let content = entry.content.to_lowercase();

    let style_score = match entry.style.as_str() {
        "poetic" => weights.style_poetic,
        "metaphorical" => weights.style_metaphorical,
        "questioning" => weights.style_questioning,
        _ => 0.0,
    };
    let emotion_score =
        (weights.emotion_step * entry.emotion_tags.len() as f32).min(weights.emotion_cap);
    let expression_score = if weights
        .evocative_words
        .iter()
        .any(|word| content.contains(&word.to_lowercase()))
    {
        weights.expressive
    } else {
        0.0
    };
    let self_ref_score = if weights
        .self_markers
        .iter()
        .any(|marker| content.contains(&marker.to_lowercase()))
    {
        weights.self_reference
    } else {
        0.0
    };
    let poetic_boost = if entry.poetic_mode() {
        weights.poetic_mode
    } else {
        0.0
    };

    let total = style_score + emotion_score + expression_score + self_ref_score + poetic_boost;
    round3(total.min(1.0))
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

/// Owner of the journal store. Appends derive the symbolic score so that
/// every persisted entry carries one.
pub struct Journal {
    store: JsonlStore,
    weights: ScoreWeights,
}

impl Journal {
    pub fn new(memory_dir: &Path, weights: ScoreWeights) -> Self {
        Self {
            store: JsonlStore::new(memory_dir.join("journal.jsonl")),
            weights,
        }
    }

    /// Score and append one entry. Persistence errors are logged and
    /// swallowed; journal durability is best-effort by design.
    pub fn append(&self, mut entry: JournalEntry) {
        entry.symbolic_score = symbolic_score(&entry, &self.weights);
        if let Err(e) = self.store.append(&entry) {
            warn!("failed to append journal entry: {e}");
        }
    }

    /// Every parseable entry in write order.
    pub fn read_all(&self) -> Vec<JournalEntry> {
        self.store.read_all()
    }

    pub fn count(&self) -> usize {
        self.read_all().len()
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }
}
