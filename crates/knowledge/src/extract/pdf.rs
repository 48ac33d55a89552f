//! PDF content extractor.
//!
//! Text is read page by page with lopdf. A page without a text layer is
//! handed to the OCR engine when one is configured; otherwise it contributes
//! nothing.

use crate::chunker::Chunker;
use crate::extract::ocr::OcrEngine;
use crate::types::{ChunkCandidate, ChunkMetadata};
use docent_core::{AppError, AppResult};
use lopdf::Document;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extractor for PDF files.
pub struct PdfExtractor {
    chunker: Chunker,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl PdfExtractor {
    pub fn new(chunker: Chunker, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { chunker, ocr }
    }

    pub fn ocr_available(&self) -> bool {
        self.ocr.is_some()
    }

    pub async fn extract(&self, path: &Path) -> AppResult<Vec<ChunkCandidate>> {
        debug!("Extracting PDF: {:?}", path);

        let bytes = tokio::fs::read(path).await?;
        let pages = tokio::task::spawn_blocking(move || extract_page_texts(&bytes))
            .await
            .map_err(|e| AppError::Extraction(format!("Task join error: {}", e)))??;

        let source = path.display().to_string();
        let mut candidates = Vec::new();
        let mut ocr_pages = 0usize;

        for (page, direct_text) in pages {
            let text = if !direct_text.trim().is_empty() {
                direct_text
            } else if let Some(ocr) = &self.ocr {
                ocr_pages += 1;
                ocr.recognize_page(path, page).await?
            } else {
                debug!("Page {} of {:?} has no text layer and OCR is unavailable", page, path);
                continue;
            };

            let metadata = ChunkMetadata::new(source.clone()).with_page(page);
            candidates.extend(
                self.chunker
                    .split(&text)
                    .into_iter()
                    .filter(|chunk| !chunk.trim().is_empty())
                    .map(|chunk| ChunkCandidate::new(chunk, metadata.clone())),
            );
        }

        if candidates.is_empty() {
            warn!("No text extracted from {:?}", path);
        } else {
            info!(
                "Extracted {} chunks from {:?} ({} pages via OCR)",
                candidates.len(),
                path,
                ocr_pages
            );
        }

        Ok(candidates)
    }
}

/// Direct text of every page, in page order.
fn extract_page_texts(bytes: &[u8]) -> AppResult<Vec<(u32, String)>> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("Failed to parse PDF: {}", e)))?;

    // get_pages is keyed by page number, so iteration is already ordered
    let pages = doc
        .get_pages()
        .keys()
        .map(|&page| {
            let text = doc.extract_text(&[page]).unwrap_or_else(|e| {
                debug!("No direct text on page {}: {}", page, e);
                String::new()
            });
            (page, text)
        })
        .collect();

    Ok(pages)
}


#[cfg(test)]
mod tests {
    use super::test_support::build_pdf;
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingOcr {
        calls: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl OcrEngine for RecordingOcr {
        fn name(&self) -> &str {
            "recording"
        }

        async fn recognize_page(&self, _pdf_path: &Path, page: u32) -> AppResult<String> {
            self.calls.lock().unwrap().push(page);
            Ok(format!("Recognized text from scanned page {}", page))
        }
    }

    fn write_pdf(dir: &TempDir, name: &str, pages: &[Option<&str>]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, build_pdf(pages)).unwrap();
        path
    }

    #[test]
    fn test_page_texts_in_order() {
        let bytes = build_pdf(&[Some("Page one text"), Some("Page two text")]);
        let pages = extract_page_texts(&bytes).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, 1);
        assert!(pages[0].1.contains("Page one text"));
        assert!(pages[1].1.contains("Page two text"));
    }

    #[tokio::test]
    async fn test_text_pages_carry_page_numbers() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "doc.pdf", &[Some("Alpha section"), Some("Beta section")]);
        let extractor = PdfExtractor::new(Chunker::default(), None);

        let candidates = extractor.extract(&path).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].metadata.page, Some(1));
        assert_eq!(candidates[1].metadata.page, Some(2));
        assert!(candidates[1].text.contains("Beta"));
    }

    #[tokio::test]
    async fn test_scanned_page_goes_through_ocr() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "scan.pdf", &[Some("Intro page"), None, Some("Closing page")]);
        let ocr = Arc::new(RecordingOcr {
            calls: Mutex::new(Vec::new()),
        });
        let extractor = PdfExtractor::new(Chunker::default(), Some(ocr.clone()));

        let candidates = extractor.extract(&path).await.unwrap();

        assert_eq!(*ocr.calls.lock().unwrap(), vec![2]);
        let scanned = candidates
            .iter()
            .find(|c| c.metadata.page == Some(2))
            .unwrap();
        assert_eq!(scanned.text, "Recognized text from scanned page 2");
    }

    #[tokio::test]
    async fn test_no_text_and_no_ocr_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, "blank.pdf", &[None, None]);
        let extractor = PdfExtractor::new(Chunker::default(), None);

        assert!(extractor.extract(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        let extractor = PdfExtractor::new(Chunker::default(), None);

        assert!(matches!(
            extractor.extract(&path).await,
            Err(AppError::Extraction(_))
        ));
    }
}
