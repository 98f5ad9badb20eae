//! Virality scoring and topic bucketing.
//!
//! # Formula
//!
//! ```text
//!                likes + retweets
//! virality = ──────────────────────────
//!             max(1, whole days elapsed)
//! ```
//!
//! Records are bucketed into two categories: [`Category::HotTopics`] when
//! the lower-cased caption contains any configured keyword, otherwise
//! [`Category::General`]. Matching is plain substring containment.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::models::MemeRecord;

/// Default hot-topic keywords.
pub const DEFAULT_HOT_KEYWORDS: &[&str] = &["pandas", "rag", "sql"];

/// Coarse topic bucket used for charting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    #[serde(rename = "Hot Topics")]
    HotTopics,
    #[serde(rename = "General")]
    General,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::HotTopics => "Hot Topics",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record together with its derived score and category.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMeme {
    pub record: MemeRecord,
    pub score: f64,
    pub category: Category,
}

/// Mean virality of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub count: usize,
    pub mean_score: f64,
}

/// `(likes + retweets) / max(1, age_days)`.
pub fn virality_score(likes: u64, retweets: u64, age_days: u64) -> f64 {
    (likes as f64 + retweets as f64) / age_days.max(1) as f64
}

/// Whole days between `created_at` and `now`, floored at 1.
pub fn age_in_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let days = (now - created_at).num_days();
    if days < 1 {
        1
    } else {
        days as u64
    }
}

/// Scores records and assigns categories from a configurable keyword set.
#[derive(Debug, Clone)]
pub struct ViralityEstimator {
    keywords: Vec<String>,
}

impl Default for ViralityEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_HOT_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl ViralityEstimator {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn categorize(&self, text: &str) -> Category {
        let lower = text.to_lowercase();
        if self.keywords.iter().any(|k| lower.contains(k.as_str())) {
            Category::HotTopics
        } else {
            Category::General
        }
    }

    /// Score every record against `now`, preserving input order.
    ///
    /// A record whose date cannot be parsed is treated as created today.
    pub fn compute(&self, records: &[MemeRecord], now: DateTime<Utc>) -> Vec<ScoredMeme> {
        records
            .iter()
            .map(|record| {
                let age = match record.metadata.created_at() {
                    Some(created) => age_in_days(created, now),
                    None => {
                        tracing::warn!(
                            date = %record.metadata.date,
                            "unparseable meme date, scoring with age of 1 day"
                        );
                        1
                    }
                };
                ScoredMeme {
                    record: record.clone(),
                    score: virality_score(record.metadata.likes, record.metadata.retweets, age),
                    category: self.categorize(&record.text),
                }
            })
            .collect()
    }
}

/// Mean score per category, `Hot Topics` first. Empty categories are omitted.
pub fn summarize(scored: &[ScoredMeme]) -> Vec<CategorySummary> {
    [Category::HotTopics, Category::General]
        .into_iter()
        .filter_map(|category| {
            let scores: Vec<f64> = scored
                .iter()
                .filter(|s| s.category == category)
                .map(|s| s.score)
                .collect();
            if scores.is_empty() {
                return None;
            }
            Some(CategorySummary {
                category,
                count: scores.len(),
                mean_score: scores.iter().sum::<f64>() / scores.len() as f64,
            })
        })
        .collect()
}
