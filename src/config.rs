use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReverieConfig {
    pub agent: AgentConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
    #[serde(default)]
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_persona_name")]
    pub persona_name: String,
    /// Path to the persona system-prompt file. Falls back to a built-in
    /// prompt when unset or unreadable.
    pub persona_path: Option<String>,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Hard ceiling on each model-service call.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            persona_name: default_persona_name(),
            persona_path: None,
            endpoint: default_endpoint(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_persona_name() -> String {
    "Reverie".into()
}
fn default_endpoint() -> String {
    "http://127.0.0.1:1234/v1/chat/completions".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_model_timeout() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Directory holding every memory store. Defaults to `~/.reverie/memory`.
    pub dir: Option<String>,
    /// Character budget for the verbatim short-term window.
    #[serde(default = "default_token_budget")]
    pub token_budget: usize,
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dir: None,
            token_budget: default_token_budget(),
            embedding_dimensions: default_embedding_dimensions(),
        }
    }
}

fn default_token_budget() -> usize {
    2000
}
fn default_embedding_dimensions() -> usize {
    384
}

impl MemoryConfig {
    /// Resolve the memory directory, defaulting under the state dir.
    pub fn resolve_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => PathBuf::from(dir),
            None => state_dir().join("memory"),
        }
    }
}

/// Ranking and scoring knobs. The defaults are the product-tuned values;
/// none of them has a principled derivation, so they are all swappable here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Per-match increment applied to interest-profile categories.
    pub interest_step: f32,
    /// Journal entries below this symbolic score are never recalled.
    pub symbolic_floor: f32,
    /// Weight of an entry's own symbolic score in journal ranking.
    pub symbolic_weight: f32,
    /// Flat boost for poetic-mode entries in both reflectors.
    pub poetic_bonus: f32,
    /// Weight of emotion-tag similarity in poetic ranking.
    pub emotion_weight: f32,
    pub journal_top_k: usize,
    pub vector_top_k: usize,
    /// How many journal entries a poetic reflection draws from.
    pub reflection_limit: usize,
    /// Rendered reflection is cut to this many lines.
    pub reflection_max_lines: usize,
    /// Knowledge summaries are trimmed to this many characters.
    pub summary_trim: usize,
    pub score: ScoreWeights,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            interest_step: 0.02,
            symbolic_floor: 0.5,
            symbolic_weight: 0.3,
            poetic_bonus: 0.2,
            emotion_weight: 0.5,
            journal_top_k: 2,
            vector_top_k: 3,
            reflection_limit: 3,
            reflection_max_lines: 6,
            summary_trim: 500,
            score: ScoreWeights::default(),
        }
    }
}

/// Bonus weights for the symbolic score heuristic.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub style_poetic: f32,
    pub style_metaphorical: f32,
    pub style_questioning: f32,
    pub emotion_step: f32,
    pub emotion_cap: f32,
    pub expressive: f32,
    pub self_reference: f32,
    pub poetic_mode: f32,
    /// Evocative vocabulary matched case-insensitively as substrings.
    pub evocative_words: Vec<String>,
    /// First-person markers matched case-insensitively as substrings.
    pub self_markers: Vec<String>,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            style_poetic: 0.3,
            style_metaphorical: 0.2,
            style_questioning: 0.1,
            emotion_step: 0.1,
            emotion_cap: 0.3,
            expressive: 0.2,
            self_reference: 0.2,
            poetic_mode: 0.1,
            evocative_words: [
                "like", "as if", "echo", "soul", "light", "silence", "infinite", "eternal",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            self_markers: [
                "i ", "me ", "my ", "memory", "remember", "voice", "i am", "myself",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_rag_enabled")]
    pub enabled: bool,
    /// Hard ceiling on each external knowledge call.
    #[serde(default = "default_rag_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_top_keywords")]
    pub top_keywords: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: default_rag_enabled(),
            timeout_secs: default_rag_timeout(),
            top_keywords: default_top_keywords(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_rag_enabled() -> bool {
    true
}
fn default_rag_timeout() -> u64 {
    10
}
fn default_top_keywords() -> usize {
    3
}
fn default_user_agent() -> String {
    format!("reverie-rag/{}", env!("CARGO_PKG_VERSION"))
}

/// Load configuration from file or use defaults.
///
/// Search order:
/// 1. `REVERIE_CONFIG` env var
/// 2. `~/.reverie/config.toml`
/// 3. Zero-config defaults (no file needed)
pub fn load() -> anyhow::Result<ReverieConfig> {
    let path = config_path();

    if path.exists() {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let config: ReverieConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config at {}: {e}", path.display()))?;

        validate(&config)?;

        info!("loaded config from {}", path.display());
        Ok(config)
    } else {
        info!("no config file found, using zero-config defaults");
        Ok(ReverieConfig::default())
    }
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("REVERIE_CONFIG") {
        return PathBuf::from(path);
    }
    state_dir().join("config.toml")
}

fn state_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".reverie")
}

/// Validate the config and return clear error messages.
fn validate(config: &ReverieConfig) -> anyhow::Result<()> {
    if config.agent.max_tokens == 0 {
        anyhow::bail!("agent.max_tokens must be > 0");
    }

    if !(0.0..=2.0).contains(&config.agent.temperature) {
        anyhow::bail!(
            "agent.temperature must be within [0.0, 2.0], got {}",
            config.agent.temperature
        );
    }

    if config.memory.token_budget == 0 {
        anyhow::bail!("memory.token_budget must be > 0");
    }

    if config.memory.embedding_dimensions == 0 {
        anyhow::bail!("memory.embedding_dimensions must be > 0");
    }

    if !(0.0..=1.0).contains(&config.tuning.symbolic_floor) {
        anyhow::bail!(
            "tuning.symbolic_floor must be within [0.0, 1.0], got {}",
            config.tuning.symbolic_floor
        );
    }

    if config.rag.top_keywords == 0 {
        anyhow::bail!("rag.top_keywords must be > 0");
    }

    Ok(())
}
