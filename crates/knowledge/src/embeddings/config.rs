//! Embedding configuration.

use crate::types::KnowledgeBaseConfig;
use serde::{Deserialize, Serialize};

/// Embedding settings for a knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "ollama", "openai"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Maximum texts per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            batch_size: default_batch_size(),
        }
    }
}

impl From<&KnowledgeBaseConfig> for EmbeddingConfig {
    fn from(base: &KnowledgeBaseConfig) -> Self {
        Self {
            provider: base.provider.clone(),
            model: base.model.clone(),
            dimensions: base.embedding_dim as usize,
            endpoint: base.endpoint.clone(),
            batch_size: default_batch_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_from_base_config() {
        let base = KnowledgeBaseConfig {
            name: "docs".to_string(),
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            embedding_dim: 1536,
            endpoint: Some("http://proxy/v1".to_string()),
            ..Default::default()
        };

        let config = EmbeddingConfig::from(&base);
        assert_eq!(config.provider, "openai");
        assert_eq!(config.dimensions, 1536);
        assert_eq!(config.endpoint.as_deref(), Some("http://proxy/v1"));
    }
}
