//! Audio extractor: one transcript per recording.

use crate::types::{ChunkCandidate, ChunkMetadata};
use async_trait::async_trait;
use docent_core::{AppError, AppResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Speech-to-text model.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    fn model_name(&self) -> &str;

    /// Transcribe raw audio bytes. `file_name` carries the container format.
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> AppResult<String>;
}

/// Extractor for audio files.
pub struct AudioExtractor {
    transcriber: Option<Arc<dyn SpeechToText>>,
}

impl AudioExtractor {
    /// `None` means no speech-to-text is configured; every audio file fails.
    pub fn new(transcriber: Option<Arc<dyn SpeechToText>>) -> Self {
        Self { transcriber }
    }

    pub async fn extract(&self, path: &Path) -> AppResult<Vec<ChunkCandidate>> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            AppError::Transcription(format!(
                "No speech-to-text model configured for {:?}",
                path
            ))
        })?;

        debug!("Transcribing audio: {:?}", path);
        let audio = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());

        let transcript = transcriber
            .transcribe(audio, &file_name)
            .await
            .map_err(|e| match e {
                AppError::Transcription(_) => e,
                other => AppError::Transcription(format!("{:?}: {}", path, other)),
            })?;

        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Err(AppError::Transcription(format!(
                "Empty transcript for {:?}",
                path
            )));
        }

        Ok(vec![ChunkCandidate::new(
            transcript,
            ChunkMetadata::new(path.display().to_string()),
        )])
    }
}

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI Whisper transcription client.
#[derive(Clone)]
pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_URL.to_string(),
            model: model.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SpeechToText for WhisperTranscriber {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, audio), fields(model = %self.model, bytes = audio.len()))]
    async fn transcribe(&self, audio: Vec<u8>, file_name: &str) -> AppResult<String> {
        let form = Form::new()
            .text("model", self.model.clone())
            .part("file", Part::bytes(audio).file_name(file_name.to_string()));

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("Failed to reach Whisper API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Transcription request failed");
            return Err(AppError::Transcription(format!(
                "Whisper API error ({}): {}",
                status, error_text
            )));
        }

        let body: TranscriptionResponse = response.json().await.map_err(|e| {
            AppError::Transcription(format!("Failed to parse transcription response: {}", e))
        })?;

        Ok(body.text)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FixedTranscriber;
    use super::*;
    use tempfile::TempDir;

    fn audio_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("memo.mp3");
        std::fs::write(&path, b"ID3 fake audio payload").unwrap();
        path
    }

    fn extractor(transcript: &str) -> AudioExtractor {
        AudioExtractor::new(Some(Arc::new(FixedTranscriber {
            transcript: transcript.to_string(),
        })))
    }

    #[tokio::test]
    async fn test_transcript_is_single_chunk() {
        let dir = TempDir::new().unwrap();
        let path = audio_file(&dir);

        let candidates = extractor("  Meeting moved to Thursday.  ")
            .extract(&path)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text, "Meeting moved to Thursday.");
        assert!(candidates[0].metadata.source.ends_with("memo.mp3"));
    }

    #[tokio::test]
    async fn test_empty_transcript_is_transcription_error() {
        let dir = TempDir::new().unwrap();
        let path = audio_file(&dir);

        assert!(matches!(
            extractor("   ").extract(&path).await,
            Err(AppError::Transcription(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_transcriber_is_transcription_error() {
        let dir = TempDir::new().unwrap();
        let path = audio_file(&dir);

        assert!(matches!(
            AudioExtractor::new(None).extract(&path).await,
            Err(AppError::Transcription(_))
        ));
    }

    #[test]
    fn test_whisper_base_url() {
        let whisper = WhisperTranscriber::new("sk-test", "whisper-1").with_base_url("http://proxy/v1/");
        assert_eq!(whisper.base_url, "http://proxy/v1");
        assert_eq!(whisper.model_name(), "whisper-1");
    }
}
