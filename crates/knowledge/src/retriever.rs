//! File-level ingestion and retrieval over one vector index.

use crate::embeddings::EmbeddingProvider;
use crate::extract::{Extractors, FileKind};
use crate::types::{ChunkMetadata, FileOutcome, IngestReport, SearchHit};
use crate::vector_index::VectorIndex;
use docent_core::{AppError, AppResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Lifecycle of a retriever's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrieverState {
    /// Nothing read from disk yet.
    Unloaded,
    /// Index loaded or created, holding zero chunks.
    LoadedEmpty,
    /// Index holds at least one chunk.
    Populated,
}

#[derive(Debug)]
enum IndexHandle {
    Unloaded,
    Loaded(VectorIndex),
}

/// Routes files to extractors and feeds the resulting chunks to the index.
pub struct Retriever {
    index_dir: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    extractors: Extractors,
    index: IndexHandle,
}

impl Retriever {
    /// A retriever in the `Unloaded` state. Nothing touches disk until the
    /// first [`load`](Self::load) or add.
    pub fn new(
        index_dir: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
        extractors: Extractors,
    ) -> Self {
        Self {
            index_dir: index_dir.into(),
            provider,
            extractors,
            index: IndexHandle::Unloaded,
        }
    }

    /// Create a retriever and load whatever is persisted in `index_dir`.
    pub fn open(
        index_dir: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
        extractors: Extractors,
    ) -> AppResult<Self> {
        let mut retriever = Self::new(index_dir, provider, extractors);
        retriever.load()?;
        Ok(retriever)
    }

    /// (Re)load the index from disk. A missing snapshot yields an empty index.
    pub fn load(&mut self) -> AppResult<RetrieverState> {
        let index = match VectorIndex::load(&self.index_dir, self.provider.clone())? {
            Some(index) => index,
            None => VectorIndex::new(&self.index_dir, self.provider.clone()),
        };
        self.index = IndexHandle::Loaded(index);
        Ok(self.state())
    }

    pub fn state(&self) -> RetrieverState {
        match &self.index {
            IndexHandle::Unloaded => RetrieverState::Unloaded,
            IndexHandle::Loaded(index) if index.is_empty() => RetrieverState::LoadedEmpty,
            IndexHandle::Loaded(_) => RetrieverState::Populated,
        }
    }

    /// Number of indexed chunks. Zero until loaded.
    pub fn count(&self) -> usize {
        match &self.index {
            IndexHandle::Unloaded => 0,
            IndexHandle::Loaded(index) => index.len(),
        }
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        match &self.index {
            IndexHandle::Unloaded => None,
            IndexHandle::Loaded(index) => Some(index),
        }
    }

    pub fn index_dir(&self) -> &Path {
        &self.index_dir
    }

    pub fn ocr_available(&self) -> bool {
        self.extractors.ocr_available()
    }

    /// Extract, embed and persist one file. Returns the chunks appended.
    ///
    /// The file type is checked before anything else, so an unsupported
    /// file never loads or modifies the index.
    pub async fn add_file(&mut self, path: &Path) -> AppResult<usize> {
        FileKind::from_path(path)?;
        self.loaded_index()?;

        let candidates = self.extractors.extract(path).await?;
        if candidates.is_empty() {
            tracing::warn!("No text extracted from {:?}", path);
            return Ok(0);
        }

        let (texts, metadatas): (Vec<String>, Vec<ChunkMetadata>) = candidates
            .into_iter()
            .map(|candidate| (candidate.text, candidate.metadata))
            .unzip();

        let added = self.loaded_index()?.add(&texts, &metadatas).await?;
        tracing::info!("Indexed {:?}: {} chunks", path, added);
        Ok(added)
    }

    /// Ingest files and directories, continuing past per-file failures.
    ///
    /// Directories are walked recursively in file-name order and files with
    /// unsupported extensions inside them are skipped. Paths named directly
    /// are always attempted, so an unsupported one shows up as a failure.
    /// Only an index that cannot be loaded aborts the batch.
    pub async fn add_files(&mut self, paths: &[PathBuf]) -> AppResult<IngestReport> {
        let start = Instant::now();
        self.loaded_index()?;

        let mut report = IngestReport::default();
        for file in expand_paths(paths) {
            let outcome = match self.add_file(&file).await {
                Ok(chunks_added) => FileOutcome {
                    path: file,
                    chunks_added,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", file, e);
                    FileOutcome {
                        path: file,
                        chunks_added: 0,
                        error: Some(e.to_string()),
                    }
                }
            };
            report.record(outcome);
        }

        report.duration_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            "Ingested {} files ({} failed): {} chunks in {:.2}s",
            report.files.len(),
            report.failed,
            report.chunks_added,
            report.duration_secs
        );
        Ok(report)
    }

    /// Append pre-extracted texts directly.
    pub async fn add_texts(&mut self, texts: &[String], metadatas: &[ChunkMetadata]) -> AppResult<usize> {
        self.loaded_index()?.add(texts, metadatas).await
    }

    /// Top-`k` chunks for `query`. Only valid once the index is populated.
    pub async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<SearchHit>> {
        match &self.index {
            IndexHandle::Loaded(index) if !index.is_empty() => index.search(query, k).await,
            IndexHandle::Loaded(_) => Err(AppError::EmptyIndex(format!(
                "nothing has been ingested into {:?}",
                self.index_dir
            ))),
            IndexHandle::Unloaded => Err(AppError::EmptyIndex(format!(
                "index at {:?} has not been loaded",
                self.index_dir
            ))),
        }
    }

    fn loaded_index(&mut self) -> AppResult<&mut VectorIndex> {
        if let IndexHandle::Unloaded = self.index {
            self.load()?;
        }
        match &mut self.index {
            IndexHandle::Loaded(index) => Ok(index),
            IndexHandle::Unloaded => Err(AppError::Knowledge(format!(
                "index at {:?} failed to load",
                self.index_dir
            ))),
        }
    }
}

/// Flatten directories into their supported files.
fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if !entry_path.is_file() {
                    continue;
                }
                if FileKind::is_supported(entry_path) {
                    files.push(entry_path.to_path_buf());
                } else {
                    tracing::debug!("Skipping unsupported file {:?}", entry_path);
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files
}
