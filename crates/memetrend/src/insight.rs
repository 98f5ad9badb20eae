//! Trend-question answering over the meme index.
//!
//! [`InsightGenerator`] is a two-state machine:
//!
//! ```text
//! Uninitialized ──build / install / load──▶ IndexReady ──answer()──▶ NarrativeReport
//! ```
//!
//! `answer` embeds the query, takes the top-K units as context, fills the
//! prompt template, and sends it to the chat model once. Every failure on
//! that path becomes [`MemeError::GenerationFailed`] (or
//! [`MemeError::Timeout`] when the model is too slow); there is no retry
//! and no partial result.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use memetrend_core::chat::ChatModel;
use memetrend_core::embedding::Embedder;
use memetrend_core::index::SearchIndex;
use memetrend_core::models::{GlossaryEntry, MemeRecord, NarrativeReport};
use memetrend_core::prompt::PromptTemplate;
use memetrend_core::MemeError;

use crate::config::Config;
use crate::index_store;

#[derive(Debug, Clone)]
pub struct InsightSettings {
    pub top_k: usize,
    pub template: PromptTemplate,
    pub timeout: Duration,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            template: PromptTemplate::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl InsightSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            top_k: config.index.top_k,
            template: config.generation.template()?,
            timeout: Duration::from_secs(config.generation.timeout_secs),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Uninitialized,
    IndexReady,
}

pub struct InsightGenerator {
    embedder: Arc<dyn Embedder>,
    chat: Arc<dyn ChatModel>,
    settings: InsightSettings,
    index: Option<SearchIndex>,
}

impl InsightGenerator {
    pub fn new(embedder: Arc<dyn Embedder>, chat: Arc<dyn ChatModel>, settings: InsightSettings) -> Self {
        Self {
            embedder,
            chat,
            settings,
            index: None,
        }
    }

    pub fn state(&self) -> GeneratorState {
        match self.index {
            Some(_) => GeneratorState::IndexReady,
            None => GeneratorState::Uninitialized,
        }
    }

    pub fn index(&self) -> Option<&SearchIndex> {
        self.index.as_ref()
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Replace the current index with a freshly built one.
    pub fn install(&mut self, index: SearchIndex) {
        self.index = Some(index);
    }

    /// Build a new index over `records` + `glossary` and install it.
    ///
    /// On failure the previous index (if any) is kept.
    pub async fn build(
        &mut self,
        records: &[MemeRecord],
        glossary: &[GlossaryEntry],
    ) -> Result<&SearchIndex, MemeError> {
        let index = SearchIndex::build(records, glossary, self.embedder.as_ref()).await?;
        Ok(self.index.insert(index))
    }

    /// Load a persisted index and install it.
    pub fn load(&mut self, dir: &Path) -> Result<&SearchIndex, MemeError> {
        let index = index_store::load(dir)?;
        Ok(self.index.insert(index))
    }

    pub async fn answer(&self, query: &str) -> Result<NarrativeReport, MemeError> {
        let index = self.index.as_ref().ok_or(MemeError::IndexNotReady)?;

        if query.trim().is_empty() {
            return Err(MemeError::GenerationFailed("query must not be empty".to_string()));
        }

        tracing::debug!(query, top_k = self.settings.top_k, "answering trend query");
        let sources = index
            .query(self.embedder.as_ref(), query, self.settings.top_k)
            .await?;
        let prompt = self.settings.template.render(query, &sources);
        tracing::debug!(
            sources = sources.len(),
            model = self.chat.model_name(),
            "sending prompt to chat model"
        );

        let text = match tokio::time::timeout(self.settings.timeout, self.chat.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                tracing::error!(error = %format!("{:#}", e), "chat model call failed");
                return Err(MemeError::GenerationFailed(format!("{:#}", e)));
            }
            Err(_) => {
                tracing::error!(timeout = ?self.settings.timeout, "chat model call timed out");
                return Err(MemeError::Timeout {
                    secs: self.settings.timeout.as_secs(),
                });
            }
        };

        Ok(NarrativeReport {
            query: query.to_string(),
            text,
            sources,
        })
    }
}
