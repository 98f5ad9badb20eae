//! TOML configuration parsing and validation.
//!
//! Every section is optional; a missing section takes the defaults shown
//! in [`DEFAULT_CONFIG_TOML`], which is also what `memetrend init` writes.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use memetrend_core::models::{default_glossary, GlossaryEntry};
use memetrend_core::prompt::PromptTemplate;
use memetrend_core::virality::DEFAULT_HOT_KEYWORDS;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub virality: ViralityConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub glossary: GlossaryConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/memes.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            top_k: default_top_k(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/meme_index")
}
fn default_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViralityConfig {
    #[serde(default = "default_hot_keywords")]
    pub hot_keywords: Vec<String>,
    #[serde(default = "default_chart_path")]
    pub chart_path: PathBuf,
    #[serde(default = "default_chart_width")]
    pub chart_width: u32,
    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

impl Default for ViralityConfig {
    fn default() -> Self {
        Self {
            hot_keywords: default_hot_keywords(),
            chart_path: default_chart_path(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
        }
    }
}

fn default_hot_keywords() -> Vec<String> {
    DEFAULT_HOT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}
fn default_chart_path() -> PathBuf {
    PathBuf::from("./data/virality_plot.png")
}
fn default_chart_width() -> u32 {
    1000
}
fn default_chart_height() -> u32 {
    600
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Ollama server URL (default `http://localhost:11434`).
    #[serde(default)]
    pub url: Option<String>,
    /// OpenAI-compatible API base (default `https://api.openai.com/v1`).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            base_url: None,
            batch_size: default_batch_size(),
            max_retries: 0,
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "hash".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Ollama server URL (default `http://localhost:11434`).
    #[serde(default)]
    pub url: Option<String>,
    /// OpenAI-compatible API base (default `https://api.openai.com/v1`).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    /// Replaces the built-in prompt; must contain `{query}` and `{context}`.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            temperature: default_temperature(),
            url: None,
            base_url: None,
            timeout_secs: default_generation_timeout_secs(),
            prompt_template: None,
        }
    }
}

fn default_generation_provider() -> String {
    "openai".to_string()
}
fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_generation_timeout_secs() -> u64 {
    60
}

impl GenerationConfig {
    pub fn template(&self) -> Result<PromptTemplate> {
        match &self.prompt_template {
            Some(t) => PromptTemplate::new(t.clone()),
            None => Ok(PromptTemplate::default()),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlossaryConfig {
    #[serde(default = "default_glossary")]
    pub entries: Vec<GlossaryEntry>,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            entries: default_glossary(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// All-defaults configuration.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.top_k == 0 {
            bail!("index.top_k must be >= 1");
        }

        if self.virality.chart_width == 0 || self.virality.chart_height == 0 {
            bail!("virality.chart_width and virality.chart_height must be > 0");
        }

        match self.embedding.provider.as_str() {
            "disabled" | "hash" | "local" => {}
            "openai" | "ollama" => {
                if self.embedding.model.is_none() {
                    bail!(
                        "embedding.model must be specified when provider is '{}'",
                        self.embedding.provider
                    );
                }
                if self.embedding.dims.is_none() || self.embedding.dims == Some(0) {
                    bail!(
                        "embedding.dims must be > 0 when provider is '{}'",
                        self.embedding.provider
                    );
                }
            }
            other => bail!(
                "Unknown embedding provider: '{}'. Must be disabled, hash, openai, ollama, or local.",
                other
            ),
        }

        if self.embedding.batch_size == 0 {
            bail!("embedding.batch_size must be > 0");
        }

        match self.generation.provider.as_str() {
            "disabled" | "openai" | "ollama" => {}
            other => bail!(
                "Unknown generation provider: '{}'. Must be disabled, openai, or ollama.",
                other
            ),
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            bail!("generation.temperature must be in [0.0, 2.0]");
        }

        if self.generation.timeout_secs == 0 {
            bail!("generation.timeout_secs must be > 0");
        }

        self.generation.template()?;

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {} (run `memetrend init` to create one)",
            path.display()
        )
    })?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Starter configuration written by `memetrend init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"# MemeTrend configuration

[store]
path = "./data/memes.json"

[index]
path = "./data/meme_index"
top_k = 5

[virality]
hot_keywords = ["pandas", "rag", "sql"]
chart_path = "./data/virality_plot.png"
chart_width = 1000
chart_height = 600

[embedding]
# disabled | hash | openai | ollama | local
# "local" runs all-minilm-l6-v2 in-process (build with --features local-embeddings-fastembed).
provider = "hash"
# model = "all-minilm-l6-v2"
# dims = 384

[generation]
# disabled | openai | ollama
provider = "openai"
model = "gpt-4o-mini"
temperature = 0.7
timeout_secs = 60
# base_url = "https://api.openai.com/v1"

[server]
bind = "127.0.0.1:7341"
"#;

/// Write [`DEFAULT_CONFIG_TOML`] to `path`, refusing to overwrite.
pub fn scaffold_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists: {}", path.display());
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}
