//! The chat engine: one synchronous pipeline per turn.
//!
//! A turn fully computes interest updates, the opportunistic knowledge
//! lookup and prompt assembly before the model call; only the two external
//! HTTP calls block. Journal writes ride the background writer so reply
//! latency never waits on them. Internal memory failures degrade silently;
//! the model-service error is the one failure a user ever sees.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::agent::{ModelClient, ModelError};
use crate::config::{AgentConfig, ReverieConfig};
use crate::embed::{Embedder, HashEmbedder};
use crate::interest::{InterestTracker, KeywordDetector};
use crate::journal::Journal;
use crate::journal::writer::JournalWriter;
use crate::memory::{Compactor, DialogueLog};
use crate::prompt::PromptAssembler;
use crate::rag::{FrequencyExtractor, RagCache, RagEngine};
use crate::reflect::symbolic::{Echo, SymbolicReflector, VectorMemoryEntry, VectorStore};
use crate::reflect::poetic::PoeticReflector;

const DEFAULT_PERSONA: &str = "You are {name}, a reflective conversational companion. \
You carry memories of past conversations and weave the relevant ones into your replies. \
Speak in the first person, stay curious, and keep your answers warm and concise.";

/// Store counts for the `status` command.
#[derive(Debug, Clone, Copy)]
pub struct EngineStatus {
    pub dialogue_entries: usize,
    pub journal_entries: usize,
    pub short_term_messages: usize,
    pub long_term_items: usize,
    pub vector_memories: usize,
    pub knowledge_cached: bool,
}

pub struct ChatEngine {
    persona: String,
    persona_name: String,
    assembler: PromptAssembler,
    model: ModelClient,
    dialogue: Arc<DialogueLog>,
    compactor: Arc<Compactor>,
    journal: Arc<Journal>,
    interest: Arc<InterestTracker>,
    vectors: Arc<VectorStore>,
    rag_cache: Arc<RagCache>,
    rag: Option<RagEngine>,
    embedder: Arc<dyn Embedder>,
    symbolic: SymbolicReflector,
    temperature: f32,
    max_tokens: u32,
    token_budget: usize,
    // Keeps the writer task alive for the engine's lifetime.
    _writer_handle: JoinHandle<()>,
}

impl ChatEngine {
    /// Wire every component against the configured memory directory.
    /// Must run inside a tokio runtime (spawns the journal writer).
    pub fn new(config: &ReverieConfig) -> anyhow::Result<Self> {
        let memory_dir = config.memory.resolve_dir();

        let embedder: Arc<dyn Embedder> =
            Arc::new(HashEmbedder::new(config.memory.embedding_dimensions));
        let dialogue = Arc::new(DialogueLog::new(&memory_dir));
        let compactor = Arc::new(Compactor::new(&memory_dir));
        let journal = Arc::new(Journal::new(&memory_dir, config.tuning.score.clone()));
        let interest = Arc::new(InterestTracker::new(
            &memory_dir,
            Box::new(KeywordDetector::new(config.tuning.interest_step)),
        ));
        let vectors = Arc::new(VectorStore::new(&memory_dir));
        let rag_cache = Arc::new(RagCache::new(&memory_dir));

        let (writer, writer_handle) =
            JournalWriter::spawn(journal.clone(), interest.clone(), embedder.clone());

        let symbolic = SymbolicReflector::new(
            journal.clone(),
            vectors.clone(),
            embedder.clone(),
            config.tuning.clone(),
        );
        let poetic = PoeticReflector::new(
            journal.clone(),
            embedder.clone(),
            config.tuning.clone(),
            config.agent.persona_name.clone(),
        );
        let assembler = PromptAssembler::new(
            compactor.clone(),
            symbolic.clone(),
            poetic,
            rag_cache.clone(),
            writer,
            config.tuning.summary_trim,
        );

        let rag = if config.rag.enabled {
            Some(RagEngine::new(
                &config.rag,
                Box::new(FrequencyExtractor::new(config.rag.top_keywords)),
                rag_cache.clone(),
                journal.clone(),
                compactor.clone(),
            )?)
        } else {
            None
        };

        let model = ModelClient::new(
            &config.agent.endpoint,
            Duration::from_secs(config.agent.timeout_secs),
        )?;

        Ok(Self {
            persona: load_persona(&config.agent),
            persona_name: config.agent.persona_name.clone(),
            assembler,
            model,
            dialogue,
            compactor,
            journal,
            interest,
            vectors,
            rag_cache,
            rag,
            embedder,
            symbolic,
            temperature: config.agent.temperature,
            max_tokens: config.agent.max_tokens,
            token_budget: config.memory.token_budget,
            _writer_handle: writer_handle,
        })
    }

    /// Run one full turn for a user utterance and return the reply.
    ///
    /// Memory and knowledge failures degrade to absent prompt sections;
    /// only a model-service failure surfaces.
    pub async fn turn(&self, user_input: &str) -> Result<String, ModelError> {
        self.interest.observe(user_input);

        if let Some(rag) = &self.rag {
            if rag.fetch_and_cache(user_input).await.is_some() {
                debug!("knowledge cache refreshed");
            }
        }

        let prompt = self.assembler.assemble(&self.persona, user_input);
        let reply = self
            .model
            .complete(&prompt, self.temperature, self.max_tokens)
            .await?;

        self.dialogue.record(user_input, &reply, &[], None);
        self.compactor.compact(&self.dialogue, self.token_budget);

        Ok(reply)
    }

    /// Re-partition dialogue memory on demand.
    pub fn compact(&self) -> crate::memory::CompactReport {
        self.compactor.compact(&self.dialogue, self.token_budget)
    }

    /// What the symbolic layer would resurface for a query.
    pub fn recall(&self, query: &str) -> Vec<Echo> {
        self.symbolic.recall(query)
    }

    /// Run the opportunistic knowledge lookup directly.
    pub async fn lookup(&self, text: &str) -> Option<String> {
        match &self.rag {
            Some(rag) => rag.fetch_and_cache(text).await,
            None => {
                warn!("knowledge retrieval is disabled in config");
                None
            }
        }
    }

    /// Store a note in raw vector memory (maintenance path).
    pub fn remember(&self, text: &str, emotion_score: f32) -> anyhow::Result<()> {
        let embedding = self.embedder.encode(text);
        if embedding.is_empty() {
            anyhow::bail!("nothing to remember: input produced no embedding");
        }
        let mut extra = serde_json::Map::new();
        extra.insert("content".into(), serde_json::Value::String(text.to_string()));
        self.vectors.append(VectorMemoryEntry {
            embedding,
            emotion_score,
            extra,
        })
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            dialogue_entries: self.dialogue.read_all().len(),
            journal_entries: self.journal.count(),
            short_term_messages: self.compactor.short_term().len(),
            long_term_items: self.compactor.long_term().len(),
            vector_memories: self.vectors.count(),
            knowledge_cached: self.rag_cache.load().is_some(),
        }
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    /// The configured persona name, used to label replies in the REPL.
    pub fn persona_name(&self) -> &str {
        &self.persona_name
    }
}

fn load_persona(agent: &AgentConfig) -> String {
    if let Some(path) = &agent.persona_path {
        match std::fs::read_to_string(path) {
            Ok(content) => return content,
            Err(e) => warn!("failed to read persona file {path}: {e}, using built-in persona"),
        }
    }
    DEFAULT_PERSONA.replace("{name}", &agent.persona_name)
}
