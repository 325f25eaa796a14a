//! Deferred journal writes.
//!
//! A turn only enqueues a draft; the spawned worker embeds the content,
//! fills in anything the draft left for inference, scores and appends.
//! Delivery is at-least-once with no ordering guarantee relative to the
//! turn that enqueued the draft, so reply latency never waits on an
//! embedding or a disk write.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Journal, JournalDraft, JournalEntry};
use crate::embed::Embedder;
use crate::interest::InterestTracker;

/// Cloneable handle for enqueueing drafts from synchronous code.
#[derive(Clone)]
pub struct JournalSender {
    tx: mpsc::UnboundedSender<JournalDraft>,
}

impl JournalSender {
    /// Fire-and-forget. A closed queue means the worker is gone; the draft
    /// is dropped with a warning rather than failing the caller.
    pub fn enqueue(&self, draft: JournalDraft) {
        if self.tx.send(draft).is_err() {
            warn!("journal writer is gone, dropping draft");
        }
    }

    /// Queue endpoint with no worker attached; drafts pile up in the
    /// returned receiver for the caller to drain itself.
    pub fn detached() -> (Self, mpsc::UnboundedReceiver<JournalDraft>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

/// Spawns the background worker draining the draft queue.
pub struct JournalWriter;

impl JournalWriter {
    pub fn spawn(
        journal: Arc<Journal>,
        interest: Arc<InterestTracker>,
        embedder: Arc<dyn Embedder>,
    ) -> (JournalSender, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<JournalDraft>();
        let handle = tokio::spawn(async move {
            while let Some(draft) = rx.recv().await {
                write_draft(&journal, &interest, embedder.as_ref(), draft);
            }
        });
        (JournalSender { tx }, handle)
    }
}

/// Materialize one draft into a journal entry.
///
/// Topics and style left unset by the draft are inferred from the interest
/// profile: topics are the categories grown past their baseline, style the
/// strongest affinity. When the content moves no interest category at all,
/// the entry stays neutral and untopiced.
pub fn write_draft(
    journal: &Journal,
    interest: &InterestTracker,
    embedder: &dyn Embedder,
    draft: JournalDraft,
) {
    let vector = embedder.encode(&draft.content);

    // The journal is an interest signal in its own right, so observe the
    // content even when the draft fully specifies topics and style.
    let (inferred_topics, inferred_style) = if interest.observe(&draft.content) {
        let profile = interest.profile();
        let topics: Vec<String> = profile
            .topics
            .iter()
            .filter(|(_, score)| **score > 0.5)
            .map(|(name, _)| name.clone())
            .collect();
        let style = profile
            .style_affinity
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "neutral".into());
        (topics, style)
    } else {
        (Vec::new(), "neutral".into())
    };

    let entry = JournalEntry {
        timestamp: Utc::now(),
        summary: draft.summary.trim().to_string(),
        topics: draft.topics.unwrap_or(inferred_topics),
        style: draft.style.unwrap_or(inferred_style),
        emotion_tags: draft.emotion_tags,
        source: draft.source,
        content: draft.content.trim().to_string(),
        vector,
        symbolic_score: 0.0, // derived on append
        meta: draft.meta,
    };

    journal.append(entry);
    debug!("journal draft written");
}
