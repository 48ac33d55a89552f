//! Image extractor: one caption per image.

use crate::types::{ChunkCandidate, ChunkMetadata};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use docent_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Vision model that describes an image.
#[async_trait]
pub trait ImageCaptioner: Send + Sync {
    fn model_name(&self) -> &str;

    /// Caption an RGB PNG. `max_words` bounds the generated length.
    async fn caption(&self, png: &[u8], max_words: usize) -> AppResult<String>;
}

/// Extractor for image files.
pub struct ImageExtractor {
    captioner: Arc<dyn ImageCaptioner>,
    max_words: usize,
}

impl ImageExtractor {
    pub fn new(captioner: Arc<dyn ImageCaptioner>, max_words: usize) -> Self {
        Self {
            captioner,
            max_words: max_words.max(1),
        }
    }

    pub async fn extract(&self, path: &Path) -> AppResult<Vec<ChunkCandidate>> {
        debug!("Extracting image: {:?}", path);

        let bytes = tokio::fs::read(path).await?;
        let png = tokio::task::spawn_blocking(move || normalize_to_rgb_png(&bytes))
            .await
            .map_err(|e| AppError::Extraction(format!("Task join error: {}", e)))?
            .map_err(|e| {
                AppError::UnsupportedInput(format!("Cannot decode image {:?}: {}", path, e))
            })?;

        let caption = self
            .captioner
            .caption(&png, self.max_words)
            .await
            .map_err(|e| match e {
                AppError::Extraction(_) => e,
                other => AppError::Extraction(format!("Captioning {:?} failed: {}", path, other)),
            })?;

        let caption = truncate_words(caption.trim(), self.max_words);
        if caption.is_empty() {
            return Err(AppError::Extraction(format!(
                "Captioner returned nothing for {:?}",
                path
            )));
        }

        debug!("Caption for {:?}: {}", path, caption);
        Ok(vec![ChunkCandidate::new(
            caption,
            ChunkMetadata::new(path.display().to_string()),
        )])
    }
}

/// Decode any supported image format and re-encode it as an RGB PNG.
fn normalize_to_rgb_png(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let rgb = image::load_from_memory(bytes)?.to_rgb8();

    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

fn truncate_words(text: &str, max_words: usize) -> String {
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const CAPTION_PROMPT: &str = "Describe this image in one short sentence.";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Captioner backed by an Ollama vision model such as `llava`.
#[derive(Debug, Clone)]
pub struct OllamaCaptioner {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaCaptioner {
    pub fn new(base_url: Option<&str>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ImageCaptioner for OllamaCaptioner {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, png), fields(model = %self.model, bytes = png.len()))]
    async fn caption(&self, png: &[u8], max_words: usize) -> AppResult<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt: CAPTION_PROMPT,
            images: vec![STANDARD.encode(png)],
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                // Roughly two tokens per word
                num_predict: (max_words * 2) as u32,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Extraction(format!("Failed to reach captioning model: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Captioning request failed");
            return Err(AppError::Extraction(format!(
                "Captioning API error ({}): {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::Extraction(format!("Failed to parse caption response: {}", e)))?;

        Ok(body.response)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Captioner returning a fixed caption.
    pub struct FixedCaptioner {
        pub caption: String,
    }

    #[async_trait]
    impl ImageCaptioner for FixedCaptioner {
        fn model_name(&self) -> &str {
            "fixed"
        }

        async fn caption(&self, png: &[u8], _max_words: usize) -> AppResult<String> {
            // Must receive a decodable RGB PNG
            let decoded = image::load_from_memory_with_format(png, image::ImageFormat::Png)
                .map_err(|e| AppError::Extraction(e.to_string()))?;
            assert!(matches!(decoded, image::DynamicImage::ImageRgb8(_)));
            Ok(self.caption.clone())
        }
    }

    pub fn write_png(path: &Path) {
        use image::{ImageBuffer, Rgba};

        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 128])
            }
        });
        img.save_with_format(path, image::ImageFormat::Png).unwrap();
    }
}
