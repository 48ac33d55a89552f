//! Plain text, Markdown and CSV loaders.

use crate::chunker::Chunker;
use crate::types::{ChunkCandidate, ChunkMetadata};
use docent_core::{AppError, AppResult};
use std::path::Path;

/// Extractor for text-like files.
pub struct TextExtractor {
    chunker: Chunker,
}

impl TextExtractor {
    pub fn new(chunker: Chunker) -> Self {
        Self { chunker }
    }

    /// Read a `.txt` or `.md` file. Invalid UTF-8 is replaced, not rejected.
    pub async fn extract_text(&self, path: &Path) -> AppResult<Vec<ChunkCandidate>> {
        let bytes = tokio::fs::read(path).await?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(self.to_candidates(path, &text))
    }

    /// Read a `.csv` file as one row per line, cells joined with `" | "`.
    pub async fn extract_csv(&self, path: &Path) -> AppResult<Vec<ChunkCandidate>> {
        let bytes = tokio::fs::read(path).await?;
        let text = csv_to_text(&bytes)
            .map_err(|e| AppError::Extraction(format!("Failed to parse CSV {:?}: {}", path, e)))?;
        Ok(self.to_candidates(path, &text))
    }

    fn to_candidates(&self, path: &Path, text: &str) -> Vec<ChunkCandidate> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let metadata = ChunkMetadata::new(path.display().to_string());
        self.chunker
            .split(text)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .map(|chunk| ChunkCandidate::new(chunk, metadata.clone()))
            .collect()
    }
}

fn csv_to_text(bytes: &[u8]) -> Result<String, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let cells: Vec<String> = record
            .iter()
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect();
        rows.push(cells.join(" | "));
    }
    Ok(rows.join("\n"))
}
