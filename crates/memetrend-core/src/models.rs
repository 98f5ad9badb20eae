//! Core data models used throughout MemeTrend.
//!
//! [`MemeRecord`] is the persisted unit; its JSON shape is the on-disk
//! records format. The remaining types are derived at runtime by the
//! virality estimator and the insight pipeline.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::index::RetrievedUnit;

/// A user-submitted meme.
///
/// JSON shape:
///
/// ```json
/// { "text": "Pandas is slow #DataScience",
///   "image_desc": "Sad panda cartoon",
///   "metadata": { "likes": 50, "retweets": 10, "date": "2026-10-18T09:30:00+00:00" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemeRecord {
    pub text: String,
    pub image_desc: String,
    pub metadata: Engagement,
}

/// Engagement counters and the creation timestamp of a meme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub retweets: u64,
    /// Creation timestamp exactly as written when the record was created.
    pub date: String,
}

impl MemeRecord {
    /// Create a record stamped with the current time.
    pub fn new(text: impl Into<String>, image_desc: impl Into<String>, likes: u64, retweets: u64) -> Self {
        Self::with_created_at(text, image_desc, likes, retweets, Utc::now())
    }

    pub fn with_created_at(
        text: impl Into<String>,
        image_desc: impl Into<String>,
        likes: u64,
        retweets: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            text: text.into(),
            image_desc: image_desc.into(),
            metadata: Engagement {
                likes,
                retweets,
                date: created_at.to_rfc3339(),
            },
        }
    }

    /// Text of the retrievable unit this record contributes to the index.
    pub fn unit_text(&self) -> String {
        format!("{} | Desc: {}", self.text, self.image_desc)
    }
}

impl Engagement {
    pub fn total(&self) -> u64 {
        self.likes.saturating_add(self.retweets)
    }

    /// Parse [`date`](Engagement::date).
    ///
    /// Accepts RFC 3339 as well as the naive forms `YYYY-MM-DD HH:MM:SS[.f]`,
    /// `YYYY-MM-DDTHH:MM:SS[.f]` and `YYYY-MM-DD`; naive values are read as UTC.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A fixed analytics glossary entry indexed alongside the memes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlossaryEntry(pub String);

impl GlossaryEntry {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GlossaryEntry {
    fn from(s: &str) -> Self {
        GlossaryEntry(s.to_string())
    }
}

/// The built-in glossary.
pub fn default_glossary() -> Vec<GlossaryEntry> {
    vec![
        "Pandas: Python lib for data manipulation, often memed for slow groupbys.".into(),
        "RAG: Retrieval-Augmented Generation, boosting LLM accuracy with external data.".into(),
        "Trend Score: Virality metric = (likes + retweets) / age_in_days".into(),
    ]
}

/// The answer to a trend question.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeReport {
    pub query: String,
    /// The model response, verbatim.
    pub text: String,
    /// Units that were handed to the model as context.
    pub sources: Vec<RetrievedUnit>,
}
