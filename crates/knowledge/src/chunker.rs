//! Text chunking with configurable size and overlap.
//!
//! Sizes are counted in characters. Each chunk ends at the best boundary
//! available inside the size limit, tried in order: paragraph break, line
//! break, sentence end, whitespace, and finally a hard cut. The next chunk
//! starts `overlap` characters before the previous end, so removing the
//! leading `overlap` characters of every chunk but the first and
//! concatenating gives back the input.

use docent_core::{AppError, AppResult};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker. `overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into overlapping chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the text.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let char_count = offsets.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            if char_count - start <= self.chunk_size {
                chunks.push(text[offsets[start]..].to_string());
                break;
            }

            let end = self.find_end(text, &offsets, start);
            chunks.push(text[offsets[start]..offsets[end]].to_string());
            start = end - self.overlap;
        }

        tracing::debug!(
            "Chunked {} chars into {} chunks (size: {}, overlap: {})",
            char_count,
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }

    /// Pick the end (char index, exclusive) of the chunk starting at `start`.
    ///
    /// The end always lies in `(start + overlap, start + chunk_size]` so the
    /// next start makes progress.
    fn find_end(&self, text: &str, offsets: &[usize], start: usize) -> usize {
        let limit = start + self.chunk_size;
        let min_end = start + self.overlap + 1;
        let window = &text[offsets[start]..offsets[limit]];
        let base = offsets[start];

        let to_char = |byte: usize| offsets.binary_search(&(base + byte)).ok();
        let in_range = |end: &usize| *end >= min_end && *end <= limit;

        for separator in ["\n\n", "\n"] {
            let found = window
                .match_indices(separator)
                .filter_map(|(i, sep)| to_char(i + sep.len()))
                .filter(in_range)
                .last();
            if let Some(end) = found {
                return end;
            }
        }

        let sentence_end = window
            .split_sentence_bound_indices()
            .skip(1)
            .filter_map(|(i, _)| to_char(i))
            .filter(in_range)
            .last();
        if let Some(end) = sentence_end {
            return end;
        }

        let word_end = window
            .split_word_bound_indices()
            .filter(|(_, segment)| segment.chars().all(char::is_whitespace))
            .filter_map(|(i, segment)| to_char(i + segment.len()))
            .filter(in_range)
            .last();

        word_end.unwrap_or(limit)
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            overlap: 100,
        }
    }
}
