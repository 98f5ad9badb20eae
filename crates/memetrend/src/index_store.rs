//! On-disk persistence for [`SearchIndex`].
//!
//! An index directory contains two files:
//!
//! | File | Contents |
//! |------|----------|
//! | `manifest.json` | model, dims, corpus hash, units, SHA-256 of `vectors.bin` |
//! | `vectors.bin` | every unit vector as little-endian `f32`, concatenated in unit order |
//!
//! Loading verifies the checksum and shapes; anything missing or
//! inconsistent is [`MemeError::IndexUnavailable`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use memetrend_core::embedding::{blob_to_vec, vec_to_blob};
use memetrend_core::index::{IndexUnit, SearchIndex};
use memetrend_core::MemeError;

const MANIFEST_FILE: &str = "manifest.json";
const VECTORS_FILE: &str = "vectors.bin";

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    model: String,
    dims: usize,
    corpus_hash: String,
    vectors_sha256: String,
    units: Vec<IndexUnit>,
}

/// Summary of a persisted index, read without loading vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub model: String,
    pub dims: usize,
    pub corpus_hash: String,
    pub units: usize,
}

/// True when `dir` holds a manifest (the index has been built at least once).
pub fn exists(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).is_file()
}

pub fn persist(index: &SearchIndex, dir: &Path) -> Result<(), MemeError> {
    let fail = |what: &str, e: &dyn std::fmt::Display| {
        MemeError::IndexUnavailable(format!("failed to {} {}: {}", what, dir.display(), e))
    };

    std::fs::create_dir_all(dir).map_err(|e| fail("create", &e))?;

    let mut blob = Vec::with_capacity(index.len() * index.dims() * 4);
    for v in index.vectors() {
        blob.extend_from_slice(&vec_to_blob(v));
    }

    let manifest = Manifest {
        model: index.model().to_string(),
        dims: index.dims(),
        corpus_hash: index.corpus_hash().to_string(),
        vectors_sha256: format!("{:x}", Sha256::digest(&blob)),
        units: index.units().to_vec(),
    };
    let json = serde_json::to_string_pretty(&manifest).map_err(|e| fail("serialize", &e))?;

    std::fs::write(dir.join(VECTORS_FILE), &blob).map_err(|e| fail("write vectors to", &e))?;
    std::fs::write(dir.join(MANIFEST_FILE), json).map_err(|e| fail("write manifest to", &e))?;

    tracing::debug!(
        dir = %dir.display(),
        units = index.len(),
        dims = index.dims(),
        "persisted search index"
    );
    Ok(())
}

fn read_manifest(dir: &Path) -> Result<Manifest, MemeError> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MemeError::IndexUnavailable(format!("no index found at {}", dir.display()))
        } else {
            MemeError::IndexUnavailable(format!("failed to read {}: {}", path.display(), e))
        }
    })?;
    serde_json::from_str(&content)
        .map_err(|e| MemeError::IndexUnavailable(format!("corrupt manifest {}: {}", path.display(), e)))
}

pub fn info(dir: &Path) -> Result<IndexInfo, MemeError> {
    let manifest = read_manifest(dir)?;
    Ok(IndexInfo {
        model: manifest.model,
        dims: manifest.dims,
        corpus_hash: manifest.corpus_hash,
        units: manifest.units.len(),
    })
}

pub fn load(dir: &Path) -> Result<SearchIndex, MemeError> {
    let manifest = read_manifest(dir)?;
    let corrupt = |msg: String| MemeError::IndexUnavailable(format!("corrupt index at {}: {}", dir.display(), msg));

    let blob = std::fs::read(dir.join(VECTORS_FILE))
        .map_err(|e| corrupt(format!("cannot read {}: {}", VECTORS_FILE, e)))?;

    if format!("{:x}", Sha256::digest(&blob)) != manifest.vectors_sha256 {
        return Err(corrupt("vector checksum mismatch".to_string()));
    }

    let row_bytes = manifest
        .dims
        .checked_mul(4)
        .ok_or_else(|| corrupt("dims/units overflow".to_string()))?;
    let expected = manifest
        .units
        .len()
        .checked_mul(row_bytes)
        .ok_or_else(|| corrupt("dims/units overflow".to_string()))?;
    if blob.len() != expected {
        return Err(corrupt(format!(
            "expected {} vector bytes, found {}",
            expected,
            blob.len()
        )));
    }

    let vectors: Vec<Vec<f32>> = if manifest.dims == 0 {
        vec![Vec::new(); manifest.units.len()]
    } else {
        blob.chunks(row_bytes).map(blob_to_vec).collect()
    };

    let index = SearchIndex::from_parts(manifest.model, manifest.dims, manifest.units, vectors)
        .map_err(|e| corrupt(e.to_string()))?;

    if index.corpus_hash() != manifest.corpus_hash {
        return Err(corrupt("corpus hash does not match units".to_string()));
    }

    tracing::debug!(dir = %dir.display(), units = index.len(), "loaded search index");
    Ok(index)
}
