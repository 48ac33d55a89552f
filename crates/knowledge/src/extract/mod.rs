//! Format-specific extraction into chunk candidates.
//!
//! Dispatch is by file extension. Each extractor returns zero or more
//! [`ChunkCandidate`]s carrying the source path and, for PDFs, the page.

pub mod audio;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod text;

pub use audio::{AudioExtractor, SpeechToText, WhisperTranscriber};
pub use image::{ImageCaptioner, ImageExtractor, OllamaCaptioner};
pub use ocr::{OcrEngine, TesseractOcr};
pub use pdf::PdfExtractor;
pub use text::TextExtractor;

use crate::chunker::Chunker;
use crate::types::{ChunkCandidate, KnowledgeBaseConfig};
use docent_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Input formats the retriever understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Image,
    Audio,
    Text,
    Markdown,
    Csv,
}

impl FileKind {
    /// Classify a path by extension (case-insensitive).
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                AppError::UnsupportedInput(format!("{:?} has no file extension", path))
            })?;

        match ext.as_str() {
            "pdf" => Ok(Self::Pdf),
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "tif" | "tiff" => Ok(Self::Image),
            "mp3" | "wav" | "m4a" | "ogg" | "flac" | "webm" => Ok(Self::Audio),
            "txt" => Ok(Self::Text),
            "md" | "markdown" => Ok(Self::Markdown),
            "csv" => Ok(Self::Csv),
            other => Err(AppError::UnsupportedInput(format!(
                "unsupported file type '.{}' ({:?})",
                other, path
            ))),
        }
    }

    pub fn is_supported(path: &Path) -> bool {
        Self::from_path(path).is_ok()
    }
}

/// External models used during extraction.
#[derive(Clone)]
pub struct Capabilities {
    pub ocr: Option<Arc<dyn OcrEngine>>,
    pub captioner: Arc<dyn ImageCaptioner>,
    pub transcriber: Option<Arc<dyn SpeechToText>>,
}

impl Capabilities {
    /// Build the default capabilities for a knowledge base.
    ///
    /// OCR tools are looked up once here. Transcription needs an OpenAI key;
    /// without one, audio files fail with a transcription error.
    pub fn detect(config: &KnowledgeBaseConfig, openai_key: Option<&str>) -> Self {
        let ocr = if config.ocr_enabled {
            TesseractOcr::detect().map(|ocr| Arc::new(ocr) as Arc<dyn OcrEngine>)
        } else {
            None
        };

        let caption_endpoint = match config.provider.as_str() {
            "ollama" => config.endpoint.as_deref(),
            _ => None,
        };
        let captioner = Arc::new(OllamaCaptioner::new(
            caption_endpoint,
            config.caption_model.clone(),
        ));

        let transcriber = openai_key.filter(|k| !k.is_empty()).map(|key| {
            Arc::new(WhisperTranscriber::new(key, config.transcription_model.clone()))
                as Arc<dyn SpeechToText>
        });

        Self {
            ocr,
            captioner,
            transcriber,
        }
    }
}

/// All extractors, configured once per retriever.
pub struct Extractors {
    pdf: PdfExtractor,
    image: ImageExtractor,
    audio: AudioExtractor,
    text: TextExtractor,
}

impl Extractors {
    pub fn new(chunker: Chunker, caption_max_words: usize, capabilities: Capabilities) -> Self {
        Self {
            pdf: PdfExtractor::new(chunker, capabilities.ocr),
            image: ImageExtractor::new(capabilities.captioner, caption_max_words),
            audio: AudioExtractor::new(capabilities.transcriber),
            text: TextExtractor::new(chunker),
        }
    }

    pub fn from_config(config: &KnowledgeBaseConfig, capabilities: Capabilities) -> AppResult<Self> {
        let chunker = Chunker::new(config.chunk_size as usize, config.chunk_overlap as usize)?;
        Ok(Self::new(
            chunker,
            config.caption_max_words as usize,
            capabilities,
        ))
    }

    pub fn ocr_available(&self) -> bool {
        self.pdf.ocr_available()
    }

    /// Extract chunk candidates from one file.
    pub async fn extract(&self, path: &Path) -> AppResult<Vec<ChunkCandidate>> {
        match FileKind::from_path(path)? {
            FileKind::Pdf => self.pdf.extract(path).await,
            FileKind::Image => self.image.extract(path).await,
            FileKind::Audio => self.audio.extract(path).await,
            FileKind::Text | FileKind::Markdown => self.text.extract_text(path).await,
            FileKind::Csv => self.text.extract_csv(path).await,
        }
    }
}
