//! Topic and style affinities, grown slowly from what the agent reads.
//!
//! Classification is a pluggable strategy (`InterestDetector`) so the rules
//! can be swapped without touching the orchestration; the default is a fixed
//! table of case-insensitive keyword patterns. Scores only ever increase, in
//! small configured steps, clamped to 1.0.

use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

use crate::store::JsonFile;

const MAX_SCORE: f32 = 1.0;
const BASELINE: f32 = 0.5;

/// Singleton affinity profile. Every known category starts at the baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestProfile {
    pub topics: BTreeMap<String, f32>,
    pub style_affinity: BTreeMap<String, f32>,
    pub last_updated: DateTime<Utc>,
}

/// Strategy for classifying text into interest categories.
pub trait InterestDetector: Send + Sync {
    /// A fresh profile holding every category this detector knows.
    fn seed(&self) -> InterestProfile;

    /// Bump every category the text matches. Returns whether anything
    /// changed.
    fn detect_and_update(&self, text: &str, profile: &mut InterestProfile) -> bool;
}

/// Default detector: fixed per-category regex tables, case-insensitive.
pub struct KeywordDetector {
    topics: Vec<(String, Vec<regex::Regex>)>,
    styles: Vec<(String, Vec<regex::Regex>)>,
    step: f32,
}

const TOPIC_PATTERNS: &[(&str, &[&str])] = &[
    ("dreams", &[r"\bdream(s|ing)?\b", "nightmare", "sleep"]),
    ("memory", &[r"\bremember\b", "past", "recall"]),
    ("solitude", &["loneliness", "solitude", "alone"]),
    ("future", &["future", "tomorrow", "possibility"]),
    ("ai", &[r"\bAI\b", "artificial intelligence", "machine"]),
];

const STYLE_PATTERNS: &[(&str, &[&str])] = &[
    ("poetic", &["like a", "as if", "whisper", "echo", "silence"]),
    ("logical", &["therefore", "because", "hence", "in other words"]),
    ("metaphorical", &["is like", "symbol", "represents"]),
    ("questioning", &[r"\?$", r"\bwhy\b", r"\bwhat if\b"]),
];

impl KeywordDetector {
    pub fn new(step: f32) -> Self {
        Self {
            topics: compile_table(TOPIC_PATTERNS),
            styles: compile_table(STYLE_PATTERNS),
            step,
        }
    }
}

fn compile_table(table: &[(&str, &[&str])]) -> Vec<(String, Vec<regex::Regex>)> {
    table
        .iter()
        .map(|(category, patterns)| {
            let compiled = patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .expect("built-in pattern compiles")
                })
                .collect();
            (category.to_string(), compiled)
        })
        .collect()
}

impl InterestDetector for KeywordDetector {
    fn seed(&self) -> InterestProfile {
        InterestProfile {
            topics: self
                .topics
                .iter()
                .map(|(name, _)| (name.clone(), BASELINE))
                .collect(),
            style_affinity: self
                .styles
                .iter()
                .map(|(name, _)| (name.clone(), BASELINE))
                .collect(),
            last_updated: Utc::now(),
        }
    }

    fn detect_and_update(&self, text: &str, profile: &mut InterestProfile) -> bool {
        let mut updated = false;

        for (category, patterns) in &self.topics {
            if patterns.iter().any(|p| p.is_match(text)) {
                let score = profile.topics.entry(category.clone()).or_insert(BASELINE);
                *score = (*score + self.step).min(MAX_SCORE);
                updated = true;
            }
        }

        for (style, patterns) in &self.styles {
            if patterns.iter().any(|p| p.is_match(text)) {
                let score = profile
                    .style_affinity
                    .entry(style.clone())
                    .or_insert(BASELINE);
                *score = (*score + self.step).min(MAX_SCORE);
                updated = true;
            }
        }

        updated
    }
}

/// Owner of the persisted profile. Loads-or-seeds on every observation and
/// writes back only when something actually changed.
pub struct InterestTracker {
    file: JsonFile,
    detector: Box<dyn InterestDetector>,
}

impl InterestTracker {
    pub fn new(memory_dir: &Path, detector: Box<dyn InterestDetector>) -> Self {
        Self {
            file: JsonFile::new(memory_dir.join("interest_profile.json")),
            detector,
        }
    }

    /// Current profile, seeded fresh when none has been persisted yet.
    pub fn profile(&self) -> InterestProfile {
        self.file.load_or(self.detector.seed())
    }

    /// Run the detector over `text` and persist the profile if it moved.
    /// Returns whether anything changed.
    pub fn observe(&self, text: &str) -> bool {
        let mut profile = self.profile();
        if !self.detector.detect_and_update(text, &mut profile) {
            return false;
        }
        profile.last_updated = Utc::now();
        if let Err(e) = self.file.save(&profile) {
            warn!("failed to save interest profile: {e}");
        }
        true
    }
}
