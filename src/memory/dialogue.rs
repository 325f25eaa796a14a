use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::store::JsonlStore;

/// One recorded turn: what the user said and how the agent replied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub agent_text: String,
    #[serde(default)]
    pub topic: String,
}

/// Sparse presence-vector of the emotions tagged on a turn. Correlated to
/// the dialogue log by timestamp only; there is no foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub tags: BTreeMap<String, f32>,
}

/// Durable append-only record of every turn, plus the companion emotion log.
/// Owns both files; everything else reads turns through this type.
pub struct DialogueLog {
    entries: JsonlStore,
    emotions: JsonlStore,
}

impl DialogueLog {
    pub fn new(memory_dir: &Path) -> Self {
        Self {
            entries: JsonlStore::new(memory_dir.join("dialogue_log.jsonl")),
            emotions: JsonlStore::new(memory_dir.join("emotion_log.jsonl")),
        }
    }

    /// Record one turn. Persistence errors are logged and swallowed: the
    /// turn that produced the reply must not fail because its log did.
    pub fn record(
        &self,
        user_text: &str,
        agent_text: &str,
        emotion_tags: &[String],
        topic: Option<&str>,
    ) {
        let entry = DialogueEntry {
            id: short_id(),
            timestamp: Utc::now(),
            user_text: user_text.to_string(),
            agent_text: agent_text.to_string(),
            topic: topic.unwrap_or_default().to_string(),
        };
        if let Err(e) = self.entries.append(&entry) {
            warn!("failed to record dialogue entry: {e}");
        }

        if !emotion_tags.is_empty() {
            let snapshot = EmotionSnapshot {
                timestamp: entry.timestamp,
                tags: emotion_tags.iter().map(|t| (t.clone(), 1.0)).collect(),
            };
            if let Err(e) = self.emotions.append(&snapshot) {
                warn!("failed to record emotion snapshot: {e}");
            }
        }
    }

    /// All turns in log order (oldest first). Malformed lines are skipped.
    pub fn read_all(&self) -> Vec<DialogueEntry> {
        self.entries.read_all()
    }

    pub fn read_emotions(&self) -> Vec<EmotionSnapshot> {
        self.emotions.read_all()
    }
}

fn short_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}
