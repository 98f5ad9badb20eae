//! Error taxonomy shared by every MemeTrend component.
//!
//! Each variant is scoped to the single interaction that produced it.
//! Nothing here is fatal to a long-running process: the CLI reports the
//! message and exits non-zero, the HTTP server maps it to a status code.

use std::path::PathBuf;

/// Failures surfaced by the record store, index, generator, and chart.
#[derive(Debug, thiserror::Error)]
pub enum MemeError {
    /// The records file could not be read, parsed, or written.
    #[error("storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    /// An index was requested over zero meme records.
    #[error("no meme records to index")]
    EmptyCorpus,

    /// A persisted index is missing, corrupt, or unreadable.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// A query was issued before any index was built or loaded.
    #[error("index not ready: build or load an index before asking questions")]
    IndexNotReady,

    /// Embedding, retrieval, or the remote model call failed.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// The remote model did not answer within the configured bound.
    #[error("generation timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The chart could not be rendered. Callers report this as a warning.
    #[error("charting failed: {0}")]
    ChartingFailed(String),
}

impl MemeError {
    pub fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        MemeError::StorageUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            MemeError::StorageUnavailable { .. } => "storage_unavailable",
            MemeError::EmptyCorpus => "no_data",
            MemeError::IndexUnavailable(_) => "index_unavailable",
            MemeError::IndexNotReady => "index_not_ready",
            MemeError::GenerationFailed(_) => "generation_failed",
            MemeError::Timeout { .. } => "timeout",
            MemeError::ChartingFailed(_) => "charting_failed",
        }
    }
}
