//! Prompt assembly: the top-level orchestrator of the memory pipeline.
//!
//! Section order is fixed: persona, short-term window, symbolic echoes,
//! knowledge reference, poetic reflection, user input. Every optional
//! section is best-effort; a store that cannot be read simply contributes
//! nothing, and `assemble` itself never fails.

use std::sync::Arc;

use crate::journal::JournalDraft;
use crate::journal::writer::JournalSender;
use crate::memory::Compactor;
use crate::rag::RagCache;
use crate::reflect::poetic::PoeticReflector;
use crate::reflect::symbolic::SymbolicReflector;
use crate::types::ChatMessage;

/// Prefix marking a resurfaced memory in the prompt.
pub const SYMBOLIC_ECHO_MARKER: &str = "[Symbolic Echo]";
/// Prefix marking the cached external-knowledge summary.
pub const KNOWLEDGE_MARKER: &str = "[Knowledge Reference]";

pub struct PromptAssembler {
    compactor: Arc<Compactor>,
    symbolic: SymbolicReflector,
    poetic: PoeticReflector,
    rag_cache: Arc<RagCache>,
    writer: JournalSender,
    summary_trim: usize,
}

impl PromptAssembler {
    pub fn new(
        compactor: Arc<Compactor>,
        symbolic: SymbolicReflector,
        poetic: PoeticReflector,
        rag_cache: Arc<RagCache>,
        writer: JournalSender,
        summary_trim: usize,
    ) -> Self {
        Self {
            compactor,
            symbolic,
            poetic,
            rag_cache,
            writer,
            summary_trim,
        }
    }

    /// Compose the ordered message sequence for one turn.
    ///
    /// Side effect: a generated poetic reflection is enqueued to the
    /// journal writer before this returns, topics seeded from the pending
    /// knowledge query when there is one.
    pub fn assemble(&self, system_prompt: &str, user_input: &str) -> Vec<ChatMessage> {
        let mut prompt = vec![ChatMessage::system(system_prompt)];

        prompt.extend(self.compactor.short_term());

        for echo in self.symbolic.recall(user_input) {
            prompt.push(ChatMessage::assistant(format!(
                "{SYMBOLIC_ECHO_MARKER}\n{}",
                echo.content
            )));
        }

        let cached = self.rag_cache.load();
        if let Some(lookup) = &cached {
            let summary = trim_at_sentence(&lookup.summary, self.summary_trim);
            if !summary.is_empty() {
                prompt.push(ChatMessage::assistant(format!(
                    "{KNOWLEDGE_MARKER}\n{summary}\n\nSource: <{}>",
                    lookup.source
                )));
            }
        }

        if let Some(reflection) = self.poetic.generate(user_input) {
            prompt.push(ChatMessage::assistant(reflection.content.clone()));

            let topics = cached
                .as_ref()
                .map(|lookup| {
                    lookup
                        .query
                        .split_whitespace()
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            self.writer.enqueue(JournalDraft {
                summary: "Reflection from poetic layer".into(),
                content: reflection.content,
                topics: Some(topics),
                style: Some("poetic".into()),
                emotion_tags: Vec::new(),
                source: "reflector".into(),
                meta: Default::default(),
            });
        }

        prompt.push(ChatMessage::user(user_input));
        prompt
    }
}

/// Trim to `limit` characters, cutting at the last sentence end inside the
/// window when there is one.
pub fn trim_at_sentence(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let window: String = text.chars().take(limit).collect();
    match window.rfind('.') {
        Some(pos) => format!("{}.", &window[..pos]),
        None => format!("{window}."),
    }
}

#[cfg(test)]
mod tests {
    use super::trim_at_sentence;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(trim_at_sentence("A short note.", 500), "A short note.");
    }

    #[test]
    fn trims_at_last_sentence_boundary() {
        let text = "First sentence. Second sentence. Third one runs long";
        let trimmed = trim_at_sentence(text, 40);
        assert_eq!(trimmed, "First sentence. Second sentence.");
    }

    #[test]
    fn no_boundary_appends_period() {
        let text = "word ".repeat(200);
        let trimmed = trim_at_sentence(&text, 50);
        assert_eq!(trimmed.chars().count(), 51);
        assert!(trimmed.ends_with('.'));
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let text = "記憶と静けさ".repeat(100);
        let trimmed = trim_at_sentence(&text, 30);
        assert!(trimmed.chars().count() <= 31);
    }
}
