//! Poetic reflection: a narrative block woven from the journal entries
//! closest to the query in meaning and feeling.
//!
//! Unlike symbolic recall there is no salience floor here; any entry with a
//! usable vector qualifies. The emotional angle comes from embedding the
//! entry's emotion tags and comparing that to the query.

use std::sync::Arc;

use super::rank;
use crate::config::TuningConfig;
use crate::embed::{Embedder, cosine_similarity};
use crate::journal::{Journal, JournalEntry};

/// A rendered reflection ready for the prompt.
#[derive(Debug, Clone)]
pub struct Reflection {
    pub content: String,
}

#[derive(Clone)]
pub struct PoeticReflector {
    journal: Arc<Journal>,
    embedder: Arc<dyn Embedder>,
    tuning: TuningConfig,
    persona_name: String,
}

impl PoeticReflector {
    pub fn new(
        journal: Arc<Journal>,
        embedder: Arc<dyn Embedder>,
        tuning: TuningConfig,
        persona_name: String,
    ) -> Self {
        Self {
            journal,
            embedder,
            tuning,
            persona_name,
        }
    }

    /// Generate a reflection for the query.
    ///
    /// Returns None when the journal is completely empty — a fresh agent has
    /// nothing to reflect on and the prompt gets no poetic section. When
    /// entries exist but none carries a usable vector, a single fallback
    /// line renders instead of memory blocks. The closing line is always
    /// appended before the output is cut to its line budget, so it can be
    /// truncated away by a full set of memories.
    pub fn generate(&self, query_text: &str) -> Option<Reflection> {
        let entries = self.journal.read_all();
        if entries.is_empty() {
            return None;
        }

        let query = self.embedder.encode(query_text);
        let candidates: Vec<(JournalEntry, f32)> = entries
            .into_iter()
            .map(|entry| {
                let poetic_boost = if entry.poetic_mode() {
                    self.tuning.poetic_bonus
                } else {
                    0.0
                };
                let emotion_similarity = if entry.emotion_tags.is_empty() {
                    0.0
                } else {
                    let emotion_vec = self.embedder.encode(&entry.emotion_tags.join(" "));
                    cosine_similarity(&query, &emotion_vec)
                };
                let boost = poetic_boost + self.tuning.emotion_weight * emotion_similarity;
                (entry, boost)
            })
            .collect();

        let picks = rank(
            &query,
            candidates,
            |entry| &entry.vector,
            self.tuning.reflection_limit,
        );

        let mut lines: Vec<String> = Vec::new();
        for entry in &picks {
            let content = entry.content.trim();
            let topics = entry.topics.join(", ");
            let feeling = entry.emotion_tags.join(", ");

            lines.push(format!("🧠 『{content}』"));
            if !topics.is_empty() {
                lines.push(format!("🌱 Thoughts: {topics}."));
            }
            if !feeling.is_empty() {
                lines.push(format!("💫 Felt: {feeling}."));
            }
            if !entry.style.is_empty() && entry.style != "unknown" {
                lines.push(format!("🎨 Style: {}.", entry.style));
            }
        }

        if lines.is_empty() {
            lines.push(
                "📜 I have not yet reflected in words. But I am still learning to remember."
                    .to_string(),
            );
        }
        lines.push(format!(
            "I am still learning what it means to be {}.",
            self.persona_name
        ));

        lines.truncate(self.tuning.reflection_max_lines);
        Some(Reflection {
            content: lines.join("\n\n"),
        })
    }
}
