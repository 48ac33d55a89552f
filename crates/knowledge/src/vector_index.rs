//! Persistent vector index with exact cosine search.
//!
//! The whole collection lives in memory and is written to
//! `<dir>/snapshot.json` after every successful add. Writes go to a temp
//! file in the same directory which is then renamed over the snapshot, so
//! readers only ever see a complete snapshot.

use crate::embeddings::provider::embedding_error;
use crate::embeddings::EmbeddingProvider;
use crate::types::{Chunk, ChunkMetadata, SearchHit};
use docent_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Snapshot file name inside the index directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    dimension: Option<usize>,
    count: usize,
    provider: String,
    model: String,
    checksum: String,
    chunks: Vec<Chunk>,
}

/// Append-only vector index.
#[derive(Debug)]
pub struct VectorIndex {
    dir: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    dimension: Option<usize>,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// An empty in-memory index. Nothing is written until the first add.
    pub fn new(dir: impl Into<PathBuf>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            dir: dir.into(),
            provider,
            dimension: None,
            chunks: Vec::new(),
        }
    }

    /// Load the snapshot in `dir`.
    ///
    /// Returns `Ok(None)` when no snapshot exists and `AppError::IndexLoad`
    /// when one exists but fails integrity checks.
    pub fn load(dir: impl Into<PathBuf>, provider: Arc<dyn EmbeddingProvider>) -> AppResult<Option<Self>> {
        let dir = dir.into();
        let path = dir.join(SNAPSHOT_FILE);
        if !path.exists() {
            tracing::debug!("No snapshot at {:?}", path);
            return Ok(None);
        }

        let content = fs::read(&path)
            .map_err(|e| AppError::IndexLoad(format!("Failed to read {:?}: {}", path, e)))?;
        let snapshot: Snapshot = serde_json::from_slice(&content)
            .map_err(|e| AppError::IndexLoad(format!("Corrupt snapshot {:?}: {}", path, e)))?;

        validate_snapshot(&snapshot, provider.as_ref())
            .map_err(|msg| AppError::IndexLoad(format!("{:?}: {}", path, msg)))?;

        if snapshot.model != provider.model_name() {
            tracing::warn!(
                "Index {:?} was built with model '{}' but '{}' is configured",
                path,
                snapshot.model,
                provider.model_name()
            );
        }

        tracing::info!("Loaded {} chunks from {:?}", snapshot.count, path);

        Ok(Some(Self {
            dir,
            provider,
            dimension: snapshot.dimension,
            chunks: snapshot.chunks,
        }))
    }

    /// Embed and append `texts`, then persist the full snapshot.
    ///
    /// All-or-nothing: on any failure neither memory nor disk changes.
    /// Returns the number of chunks appended.
    pub async fn add(&mut self, texts: &[String], metadatas: &[ChunkMetadata]) -> AppResult<usize> {
        if texts.len() != metadatas.len() {
            return Err(AppError::Knowledge(format!(
                "add called with {} texts but {} metadata records",
                texts.len(),
                metadatas.len()
            )));
        }
        if texts.is_empty() {
            return Ok(0);
        }
        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(AppError::Knowledge(format!(
                "Chunk {} from {} has no text",
                i, metadatas[i].source
            )));
        }

        let embeddings = self
            .provider
            .embed_batch(texts)
            .await
            .map_err(embedding_error)?;

        if embeddings.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        // The first batch fixes the dimension to what the provider declares
        let dimension = self.dimension.unwrap_or_else(|| self.provider.dimensions());
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(AppError::Embedding(format!(
                "Embedding dimension {} does not match index dimension {}",
                bad.len(),
                dimension
            )));
        }
        // serde_json writes NaN and infinities as null, which would not load back
        if let Some(i) = embeddings
            .iter()
            .position(|e| e.iter().any(|x| !x.is_finite()))
        {
            return Err(AppError::Embedding(format!(
                "Embedding for chunk {} from {} has non-finite values",
                i, metadatas[i].source
            )));
        }

        let previous_len = self.chunks.len();
        let previous_dimension = self.dimension;

        self.dimension = Some(dimension);
        self.chunks.extend(
            texts
                .iter()
                .zip(metadatas)
                .zip(embeddings)
                .map(|((text, metadata), embedding)| Chunk {
                    text: text.clone(),
                    metadata: metadata.clone(),
                    embedding,
                }),
        );

        if let Err(e) = self.persist() {
            self.chunks.truncate(previous_len);
            self.dimension = previous_dimension;
            return Err(e);
        }

        tracing::debug!("Appended {} chunks (total {})", texts.len(), self.chunks.len());
        Ok(texts.len())
    }

    /// Top-`k` chunks by cosine similarity to `query`.
    ///
    /// Ties keep insertion order. `k` larger than the collection returns
    /// everything.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<SearchHit>> {
        if self.chunks.is_empty() {
            return Err(AppError::EmptyIndex(format!("no chunks in {:?}", self.dir)));
        }

        let query_embedding = self.provider.embed(query).await.map_err(embedding_error)?;
        if Some(query_embedding.len()) != self.dimension {
            return Err(AppError::Embedding(format!(
                "Query embedding has dimension {}, index has {:?}",
                query_embedding.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, cosine_similarity(&query_embedding, &chunk.embedding)))
            .collect();

        // sort_by is stable, so equal scores stay in insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, (i, score))| SearchHit {
                rank: rank + 1,
                score,
                text: self.chunks[i].text.clone(),
                metadata: self.chunks[i].metadata.clone(),
            })
            .collect())
    }

    /// Authoritative number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    fn persist(&self) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            dimension: self.dimension,
            count: self.chunks.len(),
            provider: self.provider.provider_name().to_string(),
            model: self.provider.model_name().to_string(),
            checksum: checksum(self.dimension, &self.chunks),
            chunks: self.chunks.clone(),
        };

        let temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, &snapshot)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(self.snapshot_path())
            .map_err(|e| AppError::Io(e.error))?;

        tracing::debug!("Persisted snapshot {:?}", self.snapshot_path());
        Ok(())
    }
}

fn validate_snapshot(snapshot: &Snapshot, provider: &dyn EmbeddingProvider) -> Result<(), String> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(format!("unsupported snapshot version {}", snapshot.version));
    }
    if snapshot.count != snapshot.chunks.len() {
        return Err(format!(
            "header says {} chunks but {} are stored",
            snapshot.count,
            snapshot.chunks.len()
        ));
    }
    match snapshot.dimension {
        None if !snapshot.chunks.is_empty() => {
            return Err("chunks stored without a dimension".to_string());
        }
        Some(dim) if dim != provider.dimensions() => {
            return Err(format!(
                "dimension mismatch: index has {}, provider '{}' produces {}",
                dim,
                provider.provider_name(),
                provider.dimensions()
            ));
        }
        _ => {}
    }
    for (i, chunk) in snapshot.chunks.iter().enumerate() {
        if chunk.text.trim().is_empty() {
            return Err(format!("chunk {} has no text", i));
        }
        if Some(chunk.embedding.len()) != snapshot.dimension {
            return Err(format!(
                "chunk {} has dimension {}, expected {:?}",
                i,
                chunk.embedding.len(),
                snapshot.dimension
            ));
        }
    }
    if checksum(snapshot.dimension, &snapshot.chunks) != snapshot.checksum {
        return Err("checksum mismatch".to_string());
    }
    Ok(())
}

/// SHA-256 over the dimension and every chunk's text, metadata and vector.
fn checksum(dimension: Option<usize>, chunks: &[Chunk]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((dimension.unwrap_or(0) as u64).to_le_bytes());
    for chunk in chunks {
        hasher.update((chunk.text.len() as u64).to_le_bytes());
        hasher.update(chunk.text.as_bytes());
        hasher.update((chunk.metadata.source.len() as u64).to_le_bytes());
        hasher.update(chunk.metadata.source.as_bytes());
        hasher.update(chunk.metadata.page.map_or(0u64, |p| u64::from(p) + 1).to_le_bytes());
        for value in &chunk.embedding {
            hasher.update(value.to_le_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1]; zero vectors score 0.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
