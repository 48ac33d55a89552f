//! Ollama embedding provider (`/api/embed`).
//!
//! One request per batch. Connection failures and 5xx responses are retried
//! a few times; anything else fails straight away as `AppError::Embedding`.

use crate::embeddings::EmbeddingConfig;
use crate::embeddings::EmbeddingProvider;
use async_trait::async_trait;
use docent_core::{AppError, AppResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY_MS: u64 = 200;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Outcome of a single attempt.
enum Attempt {
    Done(Vec<Vec<f32>>),
    Retry(String),
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OllamaProvider {
    /// Build a client. The endpoint comes from the config, then `OLLAMA_URL`,
    /// then the local default. Nothing is sent until the first embed.
    pub fn new(config: EmbeddingConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .endpoint
            .or_else(|| std::env::var("OLLAMA_URL").ok())
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            model: config.model,
            dimensions: config.dimensions,
        })
    }

    async fn attempt(&self, texts: &[String]) -> Attempt {
        let response = match self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return Attempt::Retry(format!("Ollama unreachable at {}: {}", self.base_url, e))
            }
            Err(e) => return Attempt::Fail(format!("Failed to send request to Ollama: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("Ollama embedding error ({}): {}", status, body);
            return if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                Attempt::Retry(message)
            } else {
                Attempt::Fail(message)
            };
        }

        match response.json::<EmbedResponse>().await {
            Ok(body) => Attempt::Done(body.embeddings),
            Err(e) => Attempt::Fail(format!("Failed to parse Ollama response: {}", e)),
        }
    }

    fn check_embeddings(&self, embeddings: Vec<Vec<f32>>, expected: usize) -> AppResult<Vec<Vec<f32>>> {
        if embeddings.len() != expected {
            return Err(AppError::Embedding(format!(
                "Ollama returned {} embeddings for {} inputs",
                embeddings.len(),
                expected
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(AppError::Embedding(format!(
                "Model '{}' returned {} dimensions, expected {}",
                self.model,
                bad.len(),
                self.dimensions
            )));
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), provider = "ollama", model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 1;
        loop {
            match self.attempt(texts).await {
                Attempt::Done(embeddings) => {
                    debug!("Received {} embeddings from Ollama", embeddings.len());
                    return self.check_embeddings(embeddings, texts.len());
                }
                Attempt::Retry(message) if attempt < MAX_ATTEMPTS => {
                    warn!("{} (attempt {}/{})", message, attempt, MAX_ATTEMPTS);
                    tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt))).await;
                    attempt += 1;
                }
                Attempt::Retry(message) | Attempt::Fail(message) => {
                    return Err(AppError::Embedding(message));
                }
            }
        }
    }
}
