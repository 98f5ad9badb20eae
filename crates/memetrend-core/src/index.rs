//! Similarity-searchable index over memes and glossary entries.
//!
//! Every meme contributes one unit (`"{text} | Desc: {image_desc}"`) and
//! every glossary entry contributes one unit (the entry itself). All units
//! are embedded in a single batch; search is brute-force cosine similarity,
//! which is plenty for the corpus sizes a single user produces.
//!
//! The index is never updated in place. A changed corpus means a full
//! [`SearchIndex::build`]; [`corpus_hash`] lets callers detect that a
//! persisted index no longer matches the records on disk.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::embedding::{cosine_similarity, embed_query, Embedder};
use crate::error::MemeError;
use crate::models::{GlossaryEntry, MemeRecord};

/// Where a unit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Meme,
    Glossary,
}

/// One retrievable piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexUnit {
    /// `meme:<n>` or `glossary:<n>`.
    pub id: String,
    pub kind: UnitKind,
    pub text: String,
}

/// A unit returned from a search, with its cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedUnit {
    #[serde(flatten)]
    pub unit: IndexUnit,
    pub score: f32,
}

/// Embedded corpus ready for top-K queries.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchIndex {
    model: String,
    dims: usize,
    corpus_hash: String,
    units: Vec<IndexUnit>,
    vectors: Vec<Vec<f32>>,
}

/// Units for a corpus, memes first, then glossary, in input order.
pub fn corpus_units(records: &[MemeRecord], glossary: &[GlossaryEntry]) -> Vec<IndexUnit> {
    let memes = records.iter().enumerate().map(|(i, r)| IndexUnit {
        id: format!("meme:{}", i),
        kind: UnitKind::Meme,
        text: r.unit_text(),
    });
    let entries = glossary.iter().enumerate().map(|(i, g)| IndexUnit {
        id: format!("glossary:{}", i),
        kind: UnitKind::Glossary,
        text: g.as_str().to_string(),
    });
    memes.chain(entries).collect()
}

/// SHA-256 (hex) over the unit texts of a corpus.
pub fn corpus_hash(records: &[MemeRecord], glossary: &[GlossaryEntry]) -> String {
    hash_units(&corpus_units(records, glossary))
}

fn hash_units(units: &[IndexUnit]) -> String {
    let mut hasher = Sha256::new();
    for unit in units {
        hasher.update(unit.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

impl SearchIndex {
    /// Embed the corpus and build the index.
    ///
    /// # Errors
    ///
    /// - [`MemeError::EmptyCorpus`] when `records` is empty (the glossary
    ///   alone is not worth indexing).
    /// - [`MemeError::GenerationFailed`] when the embedder fails, returns
    ///   the wrong number of vectors, or returns vectors whose length is not
    ///   [`Embedder::dims`].
    pub async fn build(
        records: &[MemeRecord],
        glossary: &[GlossaryEntry],
        embedder: &dyn Embedder,
    ) -> Result<Self, MemeError> {
        if records.is_empty() {
            return Err(MemeError::EmptyCorpus);
        }

        let units = corpus_units(records, glossary);
        tracing::debug!(
            memes = records.len(),
            glossary = glossary.len(),
            model = embedder.model_name(),
            "building search index"
        );

        let texts: Vec<String> = units.iter().map(|u| u.text.clone()).collect();
        let vectors = embedder
            .embed(&texts)
            .await
            .map_err(|e| MemeError::GenerationFailed(format!("embedding failed: {:#}", e)))?;

        let dims = embedder.dims();
        if let Some(v) = vectors.iter().find(|v| v.len() != dims) {
            return Err(MemeError::GenerationFailed(format!(
                "embedder returned {} dims, configured {}",
                v.len(),
                dims
            )));
        }
        Self::from_parts(embedder.model_name().to_string(), dims, units, vectors)
            .map_err(|e| MemeError::GenerationFailed(e.to_string()))
    }

    /// Reassemble an index from stored parts, checking shapes.
    ///
    /// The corpus hash is recomputed from the units rather than trusted.
    pub fn from_parts(
        model: String,
        dims: usize,
        units: Vec<IndexUnit>,
        vectors: Vec<Vec<f32>>,
    ) -> anyhow::Result<Self> {
        if units.len() != vectors.len() {
            anyhow::bail!(
                "index has {} units but {} vectors",
                units.len(),
                vectors.len()
            );
        }
        if let Some(bad) = vectors.iter().position(|v| v.len() != dims) {
            anyhow::bail!(
                "vector {} has {} dims, expected {}",
                bad,
                vectors[bad].len(),
                dims
            );
        }
        let corpus_hash = hash_units(&units);
        Ok(Self {
            model,
            dims,
            corpus_hash,
            units,
            vectors,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn corpus_hash(&self) -> &str {
        &self.corpus_hash
    }

    pub fn units(&self) -> &[IndexUnit] {
        &self.units
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Top-`k` units by cosine similarity to `query_vec`.
    ///
    /// Sorted by score descending; equal scores keep insertion order.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<RetrievedUnit> {
        let mut hits: Vec<RetrievedUnit> = self
            .units
            .iter()
            .zip(self.vectors.iter())
            .map(|(unit, vec)| RetrievedUnit {
                unit: unit.clone(),
                score: cosine_similarity(query_vec, vec),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }

    /// Embed `query` and return its top-`k` units.
    pub async fn query(
        &self,
        embedder: &dyn Embedder,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedUnit>, MemeError> {
        let query_vec = embed_query(embedder, query)
            .await
            .map_err(|e| MemeError::GenerationFailed(format!("query embedding failed: {:#}", e)))?;
        if query_vec.len() != self.dims {
            return Err(MemeError::GenerationFailed(format!(
                "query embedding has {} dims but the index was built with {} ({})",
                query_vec.len(),
                self.dims,
                self.model
            )));
        }
        Ok(self.search(&query_vec, k))
    }
}
