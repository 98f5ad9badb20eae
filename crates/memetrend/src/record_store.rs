//! JSON-file record store.
//!
//! The whole collection lives in one JSON array. Each [`RecordStore::append`]
//! reads the array, pushes the new record, and rewrites the file. There is
//! no locking: one writer at a time is assumed (the HTTP server serializes
//! access through its session mutex).

use std::path::{Path, PathBuf};

use memetrend_core::models::MemeRecord;
use memetrend_core::MemeError;

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in insertion order.
    ///
    /// A missing or blank file is an empty collection, not an error.
    pub fn load_all(&self) -> Result<Vec<MemeRecord>, MemeError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MemeError::storage(&self.path, e)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| MemeError::storage(&self.path, format!("malformed records file: {}", e)))
    }

    pub fn append(&self, record: &MemeRecord) -> Result<(), MemeError> {
        let mut records = self.load_all()?;
        records.push(record.clone());
        self.write_all(&records)?;
        tracing::debug!(
            path = %self.path.display(),
            total = records.len(),
            "appended meme record"
        );
        Ok(())
    }

    pub fn len(&self) -> Result<usize, MemeError> {
        Ok(self.load_all()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, MemeError> {
        Ok(self.len()? == 0)
    }

    fn write_all(&self, records: &[MemeRecord]) -> Result<(), MemeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| MemeError::storage(&self.path, e))?;
            }
        }
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| MemeError::storage(&self.path, e))?;
        std::fs::write(&self.path, json).map_err(|e| MemeError::storage(&self.path, e))
    }
}
