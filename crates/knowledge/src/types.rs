//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Name of the knowledge base
    pub name: String,

    /// Embedding provider: "ollama", "openai", "trigram"
    pub provider: String,

    /// Model for embeddings
    pub model: String,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: u32,

    /// Custom endpoint for the embedding provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,

    /// Render scanned PDF pages through OCR when tools are installed
    #[serde(default = "default_true")]
    pub ocr_enabled: bool,

    /// Vision model used for image captions
    #[serde(default = "default_caption_model")]
    pub caption_model: String,

    /// Upper bound on caption length, in words
    #[serde(default = "default_caption_max_words")]
    pub caption_max_words: u32,

    /// Speech-to-text model
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
}

fn default_chunk_size() -> u32 {
    800
}

fn default_chunk_overlap() -> u32 {
    100
}

fn default_embedding_dim() -> u32 {
    768
}

fn default_true() -> bool {
    true
}

fn default_caption_model() -> String {
    "llava".to_string()
}

fn default_caption_max_words() -> u32 {
    50
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            embedding_dim: default_embedding_dim(),
            endpoint: None,
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            ocr_enabled: true,
            caption_model: default_caption_model(),
            caption_max_words: default_caption_max_words(),
            transcription_model: default_transcription_model(),
        }
    }
}

/// Where a chunk came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Origin identifier (the ingested path)
    pub source: String,

    /// 1-based page number for paginated sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ChunkMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            page: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Citation label, e.g. `report.pdf (p.2)` or `notes.txt (p.?)`.
    pub fn citation(&self) -> String {
        match self.page {
            Some(page) => format!("{} (p.{})", self.source, page),
            None => format!("{} (p.?)", self.source),
        }
    }
}

/// Extracted text unit before embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkCandidate {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl ChunkCandidate {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// An indexed chunk. The embedding is computed once and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

/// A ranked search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// 1-based rank
    pub rank: usize,

    /// Cosine similarity to the query
    pub score: f32,

    pub text: String,
    pub metadata: ChunkMetadata,
}

/// Outcome of ingesting one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub path: PathBuf,

    /// Chunks appended to the index
    pub chunks_added: usize,

    /// Error message when the file failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a batch ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    pub files: Vec<FileOutcome>,

    /// Total chunks appended across all files
    pub chunks_added: usize,

    /// Number of files that failed
    pub failed: usize,

    /// Duration in seconds
    pub duration_secs: f64,
}

impl IngestReport {
    pub(crate) fn record(&mut self, outcome: FileOutcome) {
        self.chunks_added += outcome.chunks_added;
        if !outcome.is_ok() {
            self.failed += 1;
        }
        self.files.push(outcome);
    }
}

/// Statistics for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseStats {
    /// Base name
    pub base_name: String,

    /// Whether the base has a config on disk
    pub exists: bool,

    /// Whether a snapshot exists, i.e. at least one add succeeded
    pub indexed: bool,

    /// Number of chunks
    pub chunks_count: usize,

    /// Number of distinct sources
    pub sources_count: usize,

    /// Embedding dimension fixed by the first write
    pub dimension: Option<usize>,

    /// Snapshot size in bytes
    pub snapshot_size_bytes: u64,

    /// Embedding provider and model
    pub provider: String,
    pub model: String,
}
