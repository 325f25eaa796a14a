use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

use super::dialogue::DialogueLog;
use crate::store::JsonFile;
use crate::types::ChatMessage;

/// A compacted turn in the long-term archive: user and agent text merged
/// into one line, keyed by the originating dialogue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTermItem {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub topic: String,
}

#[derive(Debug, Clone, Copy)]
pub struct CompactReport {
    pub kept_turns: usize,
    pub archived: usize,
}

/// Partitions the dialogue log into a verbatim short-term window and a
/// compacted long-term archive.
///
/// The short-term snapshot is a derived cache, rewritten wholesale on every
/// run; the archive only grows. Character count stands in for tokens.
pub struct Compactor {
    short_term: JsonFile,
    long_term: JsonFile,
}

impl Compactor {
    pub fn new(memory_dir: &Path) -> Self {
        Self {
            short_term: JsonFile::new(memory_dir.join("short_term_memory.json")),
            long_term: JsonFile::new(memory_dir.join("long_term_archive.json")),
        }
    }

    /// Scan the dialogue log most-recent-first, keeping turns verbatim while
    /// they fit the budget. The first turn that would overflow, and every
    /// older turn, is compacted into the archive instead. A turn that alone
    /// exceeds the whole budget is archived, leaving the window empty.
    pub fn compact(&self, dialogue: &DialogueLog, token_budget: usize) -> CompactReport {
        let entries = dialogue.read_all();

        let mut kept = Vec::new();
        let mut overflow = Vec::new();
        let mut used = 0usize;
        let mut over_budget = false;

        for entry in entries.iter().rev() {
            let cost = entry.user_text.chars().count() + entry.agent_text.chars().count();
            if !over_budget && used + cost <= token_budget {
                used += cost;
                kept.push(entry);
            } else {
                over_budget = true;
                overflow.push(entry);
            }
        }

        // Scan order was newest-first; both halves are stored oldest-first.
        kept.reverse();
        overflow.reverse();

        let mut window = Vec::with_capacity(kept.len() * 2);
        for entry in &kept {
            window.push(ChatMessage::user(entry.user_text.clone()));
            window.push(ChatMessage::assistant(entry.agent_text.clone()));
        }
        if let Err(e) = self.short_term.save(&window) {
            warn!("failed to save short-term window: {e}");
        }

        let archived = if overflow.is_empty() {
            0
        } else {
            let mut archive: Vec<LongTermItem> = self.long_term.load_or(Vec::new());
            let known: HashSet<String> = archive.iter().map(|item| item.id.clone()).collect();
            let mut added = 0;
            for entry in overflow {
                // Each dialogue entry lands in the archive exactly once,
                // even though the log is re-partitioned on every run.
                if known.contains(&entry.id) {
                    continue;
                }
                archive.push(LongTermItem {
                    id: entry.id.clone(),
                    content: format!("{} / {}", entry.user_text, entry.agent_text),
                    timestamp: entry.timestamp,
                    topic: entry.topic.clone(),
                });
                added += 1;
            }
            if added > 0 {
                if let Err(e) = self.long_term.save(&archive) {
                    warn!("failed to save long-term archive: {e}");
                }
            }
            added
        };

        info!(kept = kept.len(), archived, "compacted dialogue memory");
        CompactReport {
            kept_turns: kept.len(),
            archived,
        }
    }

    /// Current short-term window in stored (chronological) order.
    pub fn short_term(&self) -> Vec<ChatMessage> {
        self.short_term.load_or(Vec::new())
    }

    /// Full long-term archive, oldest first.
    pub fn long_term(&self) -> Vec<LongTermItem> {
        self.long_term.load_or(Vec::new())
    }
}
