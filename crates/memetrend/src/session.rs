//! One user session: records, virality, index, and insight generation.
//!
//! [`Session`] is the single entry point used by both the CLI and the
//! HTTP server. It owns the record store, the virality estimator, and the
//! insight generator, and decides when the persisted index can be reused:
//!
//! - **missing** (never built) → build and persist
//! - **stale** (corpus hash, model, or dims differ from the current
//!   records and embedder) → rebuild and persist
//! - **current** → load from disk
//!
//! There is no incremental indexing; any change to the corpus means a full
//! rebuild on the next question.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memetrend_core::chat::ChatModel;
use memetrend_core::embedding::Embedder;
use memetrend_core::index::corpus_hash;
use memetrend_core::models::{GlossaryEntry, MemeRecord, NarrativeReport};
use memetrend_core::virality::{summarize, CategorySummary, ScoredMeme, ViralityEstimator};
use memetrend_core::MemeError;

use crate::chart;
use crate::config::Config;
use crate::embedding::{create_embedder, DisabledEmbedder};
use crate::index_store::{self, IndexInfo};
use crate::insight::{InsightGenerator, InsightSettings};
use crate::llm::{create_chat_model, DisabledChat};
use crate::record_store::RecordStore;

/// A meme submitted through the CLI or `POST /memes`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMeme {
    pub text: String,
    pub image_desc: String,
    #[serde(default = "default_likes")]
    pub likes: u64,
    #[serde(default = "default_retweets")]
    pub retweets: u64,
}

pub fn default_likes() -> u64 {
    50
}
pub fn default_retweets() -> u64 {
    10
}

impl NewMeme {
    pub fn validate(&self) -> Result<(), String> {
        if self.text.trim().is_empty() {
            return Err("meme text must not be empty".to_string());
        }
        if self.image_desc.trim().is_empty() {
            return Err("image description must not be empty".to_string());
        }
        Ok(())
    }
}

/// Scores, per-category means, and where the chart went (if anywhere).
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub memes: Vec<ScoredMeme>,
    pub categories: Vec<CategorySummary>,
    pub chart: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum IndexStatus {
    Missing,
    Stale(IndexInfo),
    Current(IndexInfo),
}

/// Where the index used for a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOrigin {
    InMemory,
    Loaded,
    Built,
}

#[derive(Debug, Clone)]
struct ChartSettings {
    path: PathBuf,
    width: u32,
    height: u32,
}

pub struct Session {
    store: RecordStore,
    estimator: ViralityEstimator,
    generator: InsightGenerator,
    glossary: Vec<GlossaryEntry>,
    index_dir: PathBuf,
    chart: ChartSettings,
}

impl Session {
    /// Session with the configured embedding and generation providers.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let chat = create_chat_model(&config.generation)?;
        Self::with_providers(config, embedder, chat)
    }

    /// Session for record and trend commands; both providers disabled so
    /// no API key is needed.
    pub fn offline(config: &Config) -> Result<Self> {
        Self::with_providers(config, Arc::new(DisabledEmbedder), Arc::new(DisabledChat))
    }

    pub fn with_providers(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let settings = InsightSettings::from_config(config)?;
        Ok(Self {
            store: RecordStore::new(config.store.path.clone()),
            estimator: ViralityEstimator::new(&config.virality.hot_keywords),
            generator: InsightGenerator::new(embedder, chat, settings),
            glossary: config.glossary.entries.clone(),
            index_dir: config.index.path.clone(),
            chart: ChartSettings {
                path: config.virality.chart_path.clone(),
                width: config.virality.chart_width,
                height: config.virality.chart_height,
            },
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    /// Append a record stamped with the current time.
    ///
    /// Input is expected to have passed [`NewMeme::validate`].
    pub fn add_meme(&self, meme: NewMeme) -> Result<MemeRecord, MemeError> {
        let record = MemeRecord::new(
            meme.text.trim(),
            meme.image_desc.trim(),
            meme.likes,
            meme.retweets,
        );
        self.store.append(&record)?;
        tracing::info!(text = %record.text, "added meme");
        Ok(record)
    }

    pub fn memes(&self) -> Result<Vec<MemeRecord>, MemeError> {
        self.store.load_all()
    }

    /// Score every stored meme against `now` and redraw the chart.
    ///
    /// A chart failure is logged and leaves `chart` as `None`.
    pub fn trends(&self, now: DateTime<Utc>) -> Result<TrendReport, MemeError> {
        let records = self.store.load_all()?;
        let memes = self.estimator.compute(&records, now);
        let categories = summarize(&memes);

        let chart = match chart::render_chart(
            &categories,
            &self.chart.path,
            self.chart.width,
            self.chart.height,
        ) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "could not render virality chart");
                None
            }
        };

        Ok(TrendReport {
            memes,
            categories,
            chart,
        })
    }

    pub fn index_status(&self) -> Result<IndexStatus, MemeError> {
        let records = self.store.load_all()?;
        self.status_against(&corpus_hash(&records, &self.glossary))
    }

    fn status_against(&self, expected_hash: &str) -> Result<IndexStatus, MemeError> {
        if !index_store::exists(&self.index_dir) {
            return Ok(IndexStatus::Missing);
        }
        let info = index_store::info(&self.index_dir)?;
        let embedder = self.generator.embedder();
        if info.corpus_hash == expected_hash
            && info.model == embedder.model_name()
            && info.dims == embedder.dims()
        {
            Ok(IndexStatus::Current(info))
        } else {
            Ok(IndexStatus::Stale(info))
        }
    }

    /// Build the index over all stored records and persist it.
    pub async fn build_index(&mut self) -> Result<IndexInfo, MemeError> {
        let records = self.store.load_all()?;
        self.build_from(&records).await
    }

    async fn build_from(&mut self, records: &[MemeRecord]) -> Result<IndexInfo, MemeError> {
        let index = self.generator.build(records, &self.glossary).await?;
        index_store::persist(index, &self.index_dir)?;
        tracing::info!(
            units = index.len(),
            model = index.model(),
            dir = %self.index_dir.display(),
            "built search index"
        );
        Ok(IndexInfo {
            model: index.model().to_string(),
            dims: index.dims(),
            corpus_hash: index.corpus_hash().to_string(),
            units: index.len(),
        })
    }

    /// Make sure the generator holds an index matching the stored records.
    pub async fn ensure_index(&mut self, rebuild: bool) -> Result<IndexOrigin, MemeError> {
        let records = self.store.load_all()?;
        if records.is_empty() {
            return Err(MemeError::EmptyCorpus);
        }
        let expected = corpus_hash(&records, &self.glossary);

        if !rebuild {
            let embedder = self.generator.embedder();
            if let Some(index) = self.generator.index() {
                if index.corpus_hash() == expected
                    && index.model() == embedder.model_name()
                    && index.dims() == embedder.dims()
                {
                    return Ok(IndexOrigin::InMemory);
                }
            }

            match self.status_against(&expected)? {
                IndexStatus::Current(_) => {
                    self.generator.load(&self.index_dir)?;
                    return Ok(IndexOrigin::Loaded);
                }
                IndexStatus::Stale(_) => tracing::info!("persisted index is stale, rebuilding"),
                IndexStatus::Missing => tracing::info!("no persisted index, building"),
            }
        }

        self.build_from(&records).await?;
        Ok(IndexOrigin::Built)
    }

    /// Answer `query` from the current records, (re)building the index
    /// when needed.
    pub async fn ask(&mut self, query: &str, rebuild: bool) -> Result<NarrativeReport, MemeError> {
        check_query(query)?;
        self.ensure_index(rebuild).await?;
        self.generator.answer(query).await
    }
}

/// Blank questions are rejected before any index work happens.
pub fn check_query(query: &str) -> Result<(), MemeError> {
    if query.trim().is_empty() {
        return Err(MemeError::GenerationFailed("query must not be empty".to_string()));
    }
    Ok(())
}
