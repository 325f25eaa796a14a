//! Opportunistic retrieval-augmented generation.
//!
//! Per turn: extract candidate keywords from the input, skip terms the
//! agent has already absorbed (journal or long-term archive), route the
//! first genuinely new term to an external knowledge source, and cache the
//! single most recent result for the assembler. External failures never
//! fail the turn; they collapse to "no result".

pub mod sources;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::RagConfig;
use crate::journal::Journal;
use crate::memory::Compactor;
use crate::store::JsonFile;
use sources::SourceRouter;

/// Language profile hint for keyword extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LangHint {
    English,
    Japanese,
}

/// Heuristic script detection: any CJK codepoint routes to the Japanese
/// profile.
pub fn detect_lang(text: &str) -> LangHint {
    if text.chars().any(crate::embed::is_cjk) {
        LangHint::Japanese
    } else {
        LangHint::English
    }
}

/// Keyword extraction seam; implementations return candidates most
/// relevant first.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str, lang: LangHint) -> Vec<String>;
}

const STOPWORDS: &[&str] = &[
    "the", "and", "that", "this", "with", "from", "have", "has", "had", "was", "were", "are",
    "will", "would", "could", "should", "what", "when", "where", "which", "who", "whom", "about",
    "into", "over", "under", "then", "than", "them", "they", "their", "there", "here", "your",
    "you", "our", "for", "but", "not", "can", "its", "it's", "how", "all", "any", "some", "just",
    "very", "too", "also", "been", "being", "does", "did", "doing",
];

/// Default extractor: frequency-scored uni- and bi-grams, stopword-filtered
/// for English; phrase runs for Japanese. Phrases outrank single words at
/// equal frequency.
pub struct FrequencyExtractor {
    top_n: usize,
}

impl FrequencyExtractor {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    fn top_candidates(&self, candidates: Vec<String>) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for candidate in &candidates {
            *counts.entry(candidate.clone()).or_default() += 1;
        }

        let mut seen = std::collections::HashSet::new();
        let mut unique: Vec<String> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();

        // Weight = occurrences x words-in-phrase; stable sort keeps
        // first-appearance order among equals.
        unique.sort_by_key(|c| {
            let weight =
                counts.get(c).copied().unwrap_or(0) * c.split_whitespace().count().max(1);
            std::cmp::Reverse(weight)
        });
        unique.truncate(self.top_n);
        unique
    }
}

impl KeywordExtractor for FrequencyExtractor {
    fn extract(&self, text: &str, lang: LangHint) -> Vec<String> {
        match lang {
            LangHint::English => self.top_candidates(english_candidates(text)),
            LangHint::Japanese => self.top_candidates(japanese_candidates(text)),
        }
    }
}

fn english_candidates(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(&w.as_str()))
        .collect();

    let mut candidates = Vec::new();
    for pair in words.windows(2) {
        candidates.push(format!("{} {}", pair[0], pair[1]));
    }
    candidates.extend(words);
    candidates
}

fn japanese_candidates(text: &str) -> Vec<String> {
    // No reliable word boundaries; treat each unbroken CJK run as a phrase.
    text.split(|c: char| !crate::embed::is_cjk(c))
        .map(str::trim)
        .filter(|run| !run.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SummaryRecord {
    query: String,
    summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OriginRecord {
    query: String,
    source: String,
}

/// The most recent successful lookup, joined from the two cache files.
#[derive(Debug, Clone)]
pub struct CachedLookup {
    pub query: String,
    pub summary: String,
    pub source: String,
}

/// Single-slot cache: two paired files, overwritten together on every
/// successful fetch. Not a history.
pub struct RagCache {
    summary: JsonFile,
    origin: JsonFile,
}

impl RagCache {
    pub fn new(memory_dir: &Path) -> Self {
        Self {
            summary: JsonFile::new(memory_dir.join("rag_summary.json")),
            origin: JsonFile::new(memory_dir.join("rag_origin.json")),
        }
    }

    /// Overwrite both slots. Persistence errors are logged and swallowed;
    /// the lookup result is still usable for the current turn.
    pub fn store(&self, query: &str, summary: &str, source: &str) {
        let record = SummaryRecord {
            query: query.to_string(),
            summary: summary.to_string(),
        };
        if let Err(e) = self.summary.save(&record) {
            warn!("failed to save knowledge summary: {e}");
        }
        let origin = OriginRecord {
            query: query.to_string(),
            source: source.to_string(),
        };
        if let Err(e) = self.origin.save(&origin) {
            warn!("failed to save knowledge origin: {e}");
        }
    }

    /// The cached lookup, if any. The origin file is optional; a summary
    /// without provenance still surfaces with an empty source.
    pub fn load(&self) -> Option<CachedLookup> {
        let summary: SummaryRecord = self.summary.load()?;
        let origin: Option<OriginRecord> = self.origin.load();
        Some(CachedLookup {
            query: summary.query,
            summary: summary.summary,
            source: origin.map(|o| o.source).unwrap_or_default(),
        })
    }
}

pub struct RagEngine {
    extractor: Box<dyn KeywordExtractor>,
    router: SourceRouter,
    cache: Arc<RagCache>,
    journal: Arc<Journal>,
    compactor: Arc<Compactor>,
    client: reqwest::Client,
    top_keywords: usize,
}

impl RagEngine {
    pub fn new(
        config: &RagConfig,
        extractor: Box<dyn KeywordExtractor>,
        cache: Arc<RagCache>,
        journal: Arc<Journal>,
        compactor: Arc<Compactor>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build knowledge client: {e}"))?;

        Ok(Self {
            extractor,
            router: SourceRouter::new(),
            cache,
            journal,
            compactor,
            client,
            top_keywords: config.top_keywords,
        })
    }

    /// A term is new iff it appears nowhere in the journal or the long-term
    /// archive (case-insensitive substring). Terms the agent has already
    /// absorbed are never looked up again.
    pub fn is_new_term(&self, term: &str) -> bool {
        let needle = term.to_lowercase();

        let known_in_journal = self
            .journal
            .read_all()
            .iter()
            .any(|entry| entry.content.to_lowercase().contains(&needle));
        if known_in_journal {
            return false;
        }

        !self
            .compactor
            .long_term()
            .iter()
            .any(|item| item.content.to_lowercase().contains(&needle))
    }

    /// Try extracted keywords in order; the first that is both novel and
    /// yields a non-empty summary overwrites the cache and is returned.
    /// Otherwise None, with the cache left untouched.
    pub async fn fetch_and_cache(&self, text: &str) -> Option<String> {
        let lang = detect_lang(text);
        let keywords = self.extractor.extract(text, lang);

        for term in keywords.iter().take(self.top_keywords) {
            if !self.is_new_term(term) {
                debug!(term = %term, "term already known, skipping lookup");
                continue;
            }

            let source = self.router.route(term);
            match source.lookup(&self.client, term).await {
                Some((summary, url)) if !summary.trim().is_empty() => {
                    self.cache.store(term, &summary, &url);
                    info!(term = %term, source = source.name(), "cached knowledge lookup");
                    return Some(summary);
                }
                _ => {
                    debug!(term = %term, source = source.name(), "no result");
                }
            }
        }

        None
    }
}
