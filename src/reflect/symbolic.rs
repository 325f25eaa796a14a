//! Symbolic recall: two independent rankings, concatenated.
//!
//! The journal side applies a symbolic-score floor and rewards poetic and
//! high-salience entries; the raw vector-memory side boosts by each entry's
//! own stored emotion score. Results are concatenated (journal first),
//! never merged or deduplicated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use super::rank;
use crate::config::TuningConfig;
use crate::embed::Embedder;
use crate::journal::{Journal, JournalEntry};
use crate::store::JsonFile;

/// Entry in the raw vector-memory store. Only `embedding` and
/// `emotion_score` are interpreted; everything else rides along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMemoryEntry {
    #[serde(default)]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub emotion_score: f32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl VectorMemoryEntry {
    /// Recallable text: the `content` field, falling back to `text`.
    pub fn content(&self) -> Option<&str> {
        self.extra
            .get("content")
            .or_else(|| self.extra.get("text"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Owner of the vector-memory file. The per-turn pipeline only reads it;
/// writes happen through the out-of-band maintenance path.
pub struct VectorStore {
    file: JsonFile,
}

impl VectorStore {
    pub fn new(memory_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(memory_dir.join("vector_memory.json")),
        }
    }

    pub fn read_all(&self) -> Vec<VectorMemoryEntry> {
        self.file.load_or(Vec::new())
    }

    pub fn count(&self) -> usize {
        self.read_all().len()
    }

    /// Append one entry (read-modify-write).
    pub fn append(&self, entry: VectorMemoryEntry) -> anyhow::Result<()> {
        let mut entries = self.read_all();
        entries.push(entry);
        self.file.save(&entries)
    }
}

/// A memory resurfaced for the prompt.
#[derive(Debug, Clone)]
pub struct Echo {
    pub content: String,
    pub origin: EchoOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoOrigin {
    Journal,
    VectorMemory,
}

#[derive(Clone)]
pub struct SymbolicReflector {
    journal: Arc<Journal>,
    vectors: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    tuning: TuningConfig,
}

impl SymbolicReflector {
    pub fn new(
        journal: Arc<Journal>,
        vectors: Arc<VectorStore>,
        embedder: Arc<dyn Embedder>,
        tuning: TuningConfig,
    ) -> Self {
        Self {
            journal,
            vectors,
            embedder,
            tuning,
        }
    }

    /// Top journal matches ahead of top vector-memory matches. Entries
    /// without any recallable text are dropped.
    pub fn recall(&self, query_text: &str) -> Vec<Echo> {
        let query = self.embedder.encode(query_text);

        let mut echoes: Vec<Echo> = self
            .recall_journal(&query)
            .into_iter()
            .filter(|entry| !entry.content.is_empty())
            .map(|entry| Echo {
                content: entry.content,
                origin: EchoOrigin::Journal,
            })
            .collect();

        echoes.extend(self.recall_vectors(&query).iter().filter_map(|entry| {
            entry.content().map(|content| Echo {
                content: content.to_string(),
                origin: EchoOrigin::VectorMemory,
            })
        }));

        echoes
    }

    /// Journal ranking. Entries below the symbolic floor are excluded
    /// before ranking; the rest are boosted by poetic signals and by their
    /// own symbolic score.
    pub fn recall_journal(&self, query: &[f32]) -> Vec<JournalEntry> {
        let candidates: Vec<(JournalEntry, f32)> = self
            .journal
            .read_all()
            .into_iter()
            .filter(|entry| entry.symbolic_score >= self.tuning.symbolic_floor)
            .map(|entry| {
                let poetic = entry.poetic_mode() || entry.style == "poetic";
                let boost = if poetic { self.tuning.poetic_bonus } else { 0.0 }
                    + self.tuning.symbolic_weight * entry.symbolic_score;
                (entry, boost)
            })
            .collect();

        rank(
            query,
            candidates,
            |entry| &entry.vector,
            self.tuning.journal_top_k,
        )
    }

    /// Vector-memory ranking, boosted by each entry's stored emotion score.
    pub fn recall_vectors(&self, query: &[f32]) -> Vec<VectorMemoryEntry> {
        let candidates: Vec<(VectorMemoryEntry, f32)> = self
            .vectors
            .read_all()
            .into_iter()
            .map(|entry| {
                let boost = entry.emotion_score;
                (entry, boost)
            })
            .collect();

        rank(
            query,
            candidates,
            |entry| &entry.embedding,
            self.tuning.vector_top_k,
        )
    }
}
