//! Embedding provider trait, factory and lazy handle.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{OllamaProvider, OpenAiProvider, TrigramProvider};
use docent_core::{AppError, AppResult};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Re-tag any provider failure as an embedding failure.
pub(crate) fn embedding_error(err: AppError) -> AppError {
    match err {
        AppError::Embedding(_) => err,
        other => AppError::Embedding(other.to_string()),
    }
}

/// Create an embedding provider based on configuration.
///
/// Callers that may never embed anything should use [`LazyProvider`] so no
/// client is built up front.
pub async fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "trigram" | "mock" => Ok(Arc::new(TrigramProvider::new(config.dimensions))),

        "ollama" => Ok(Arc::new(OllamaProvider::new(config.clone())?)),

        "openai" => {
            let key = api_key.filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Config("OpenAI embedding provider requires an API key".to_string())
            })?;
            Ok(Arc::new(OpenAiProvider::new(config.clone(), key)?))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama, openai",
            config.provider
        ))),
    }
}

/// Embedding provider that is built on first use.
///
/// Name, model and dimensions come from the configuration, so inspecting an
/// index never touches the network.
#[derive(Debug)]
pub struct LazyProvider {
    config: EmbeddingConfig,
    api_key: Option<String>,
    inner: OnceCell<Arc<dyn EmbeddingProvider>>,
}

impl LazyProvider {
    pub fn new(config: EmbeddingConfig, api_key: Option<String>) -> Self {
        Self {
            config,
            api_key,
            inner: OnceCell::new(),
        }
    }

    /// Whether the underlying provider has been built.
    pub fn is_initialized(&self) -> bool {
        self.inner.initialized()
    }

    async fn get(&self) -> AppResult<&Arc<dyn EmbeddingProvider>> {
        self.inner
            .get_or_try_init(|| async {
                tracing::debug!(
                    "Creating embedding provider: provider={}, model={}, dimensions={}",
                    self.config.provider,
                    self.config.model,
                    self.config.dimensions
                );
                create_provider(&self.config, self.api_key.as_deref()).await
            })
            .await
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for LazyProvider {
    fn provider_name(&self) -> &str {
        &self.config.provider
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let provider = self.get().await.map_err(embedding_error)?;

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            embeddings.extend(provider.embed_batch(batch).await.map_err(embedding_error)?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigram_config() -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 64,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_trigram_provider() {
        let provider = create_provider(&trigram_config(), None).await.unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.model_name(), "trigram-v1");
        assert_eq!(provider.dimensions(), 64);
    }

    #[tokio::test]
    async fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "unknown".to_string(),
            ..Default::default()
        };

        let err = create_provider(&config, None).await.unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_openai_requires_key() {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            ..Default::default()
        };

        assert!(matches!(
            create_provider(&config, None).await,
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_lazy_provider_builds_once_on_first_embed() {
        let lazy = LazyProvider::new(trigram_config(), None);
        assert!(!lazy.is_initialized());
        assert_eq!(lazy.dimensions(), 64);

        let first = lazy.embed("hello world").await.unwrap();
        assert!(lazy.is_initialized());
        let second = lazy.embed("hello world").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_lazy_provider_reports_embedding_error() {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            ..Default::default()
        };
        let lazy = LazyProvider::new(config, None);

        assert!(matches!(
            lazy.embed("text").await,
            Err(AppError::Embedding(_))
        ));
        assert!(!lazy.is_initialized());
    }

    #[tokio::test]
    async fn test_lazy_provider_splits_batches() {
        let config = EmbeddingConfig {
            batch_size: 2,
            ..trigram_config()
        };
        let lazy = LazyProvider::new(config, None);
        let texts: Vec<String> = (0..5).map(|i| format!("text number {}", i)).collect();

        let embeddings = lazy.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 5);
    }
}
