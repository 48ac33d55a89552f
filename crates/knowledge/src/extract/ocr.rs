//! OCR for scanned PDF pages.

use async_trait::async_trait;
use docent_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Recognizes the text of a single rendered PDF page.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognize text on `page` (1-based) of the PDF at `pdf_path`.
    async fn recognize_page(&self, pdf_path: &Path, page: u32) -> AppResult<String>;
}

/// Rendering resolution for OCR.
const RENDER_DPI: u32 = 300;

/// OCR through `pdftoppm` (poppler) and `tesseract`.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pdftoppm: PathBuf,
    tesseract: PathBuf,
    language: String,
}

impl TesseractOcr {
    /// Locate both tools on `PATH`. `None` means OCR is unavailable.
    pub fn detect() -> Option<Self> {
        let pdftoppm = which::which("pdftoppm").ok();
        let tesseract = which::which("tesseract").ok();

        match (pdftoppm, tesseract) {
            (Some(pdftoppm), Some(tesseract)) => {
                info!("OCR available: {:?}, {:?}", pdftoppm, tesseract);
                Some(Self {
                    pdftoppm,
                    tesseract,
                    language: "eng".to_string(),
                })
            }
            (pdftoppm, tesseract) => {
                debug!(
                    "OCR unavailable (pdftoppm: {}, tesseract: {})",
                    pdftoppm.is_some(),
                    tesseract.is_some()
                );
                None
            }
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    async fn run(cmd: &mut Command, what: &str) -> AppResult<Vec<u8>> {
        let output = cmd
            .output()
            .await
            .map_err(|e| AppError::Extraction(format!("Failed to run {}: {}", what, e)))?;

        if !output.status.success() {
            return Err(AppError::Extraction(format!(
                "{} exited with {}: {}",
                what,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize_page(&self, pdf_path: &Path, page: u32) -> AppResult<String> {
        let scratch = tempfile::tempdir()?;
        let prefix = scratch.path().join("page");
        let page_arg = page.to_string();

        Self::run(
            Command::new(&self.pdftoppm)
                .arg("-r")
                .arg(RENDER_DPI.to_string())
                .arg("-f")
                .arg(&page_arg)
                .arg("-l")
                .arg(&page_arg)
                .arg("-png")
                .arg("-singlefile")
                .arg(pdf_path)
                .arg(&prefix),
            "pdftoppm",
        )
        .await?;

        let image = prefix.with_extension("png");
        let stdout = Self::run(
            Command::new(&self.tesseract)
                .arg(&image)
                .arg("stdout")
                .arg("-l")
                .arg(&self.language),
            "tesseract",
        )
        .await?;

        let text = String::from_utf8_lossy(&stdout).into_owned();
        debug!("OCR page {} of {:?}: {} chars", page, pdf_path, text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_detected_engine_reports_missing_pdf() {
        let Some(ocr) = TesseractOcr::detect() else {
            println!("Skipping test: OCR tools not installed");
            return;
        };

        let result = ocr.recognize_page(Path::new("/nonexistent/file.pdf"), 1).await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }

    #[test]
    fn test_language_override() {
        if let Some(ocr) = TesseractOcr::detect() {
            assert_eq!(ocr.with_language("por").language, "por");
        }
    }
}
