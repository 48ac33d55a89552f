//! Tests for ranking correctness.

use crate::embeddings::EmbeddingProvider;
use crate::types::ChunkMetadata;
use crate::vector_index::VectorIndex;
use async_trait::async_trait;
use docent_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Provider with hand-picked vectors per text.
#[derive(Debug)]
struct LookupProvider {
    vectors: HashMap<String, Vec<f32>>,
}

impl LookupProvider {
    fn new(entries: &[(&str, [f32; 4])]) -> Arc<Self> {
        Arc::new(Self {
            vectors: entries
                .iter()
                .map(|(text, v)| (text.to_string(), normalize(v)))
                .collect(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for LookupProvider {
    fn provider_name(&self) -> &str {
        "lookup"
    }

    fn model_name(&self) -> &str {
        "lookup"
    }

    fn dimensions(&self) -> usize {
        4
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .ok_or_else(|| AppError::Embedding(format!("no vector for '{}'", t)))
            })
            .collect()
    }
}

/// Helper to create a normalized embedding.
fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_relevant_chunk_outranks_unrelated() {
    let dir = TempDir::new().unwrap();
    let provider = LookupProvider::new(&[
        ("Rust is a systems programming language", [1.0, 0.5, 0.2, 0.1]),
        ("Cooking recipes for pasta", [-0.3, -0.8, 0.4, -0.2]),
        ("rust programming", [0.9, 0.4, 0.3, 0.1]),
    ]);
    let mut index = VectorIndex::new(dir.path(), provider);

    index
        .add(
            &strings(&["Rust is a systems programming language", "Cooking recipes for pasta"]),
            &[ChunkMetadata::new("rust.md"), ChunkMetadata::new("food.md")],
        )
        .await
        .unwrap();

    let hits = index.search("rust programming", 5).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].metadata.source, "rust.md");
    assert!(hits[0].score > 0.95, "score was {}", hits[0].score);
    assert!(hits[1].score < 0.0, "score was {}", hits[1].score);
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![1, 2]);
}

#[tokio::test]
async fn test_scores_are_descending() {
    let dir = TempDir::new().unwrap();
    let provider = LookupProvider::new(&[
        ("far", [0.0, 0.0, 1.0, 0.0]),
        ("near", [1.0, 0.1, 0.0, 0.0]),
        ("middle", [1.0, 1.0, 0.0, 0.0]),
        ("query", [1.0, 0.0, 0.0, 0.0]),
    ]);
    let mut index = VectorIndex::new(dir.path(), provider);

    index
        .add(
            &strings(&["far", "near", "middle"]),
            &[
                ChunkMetadata::new("x"),
                ChunkMetadata::new("x"),
                ChunkMetadata::new("x"),
            ],
        )
        .await
        .unwrap();

    let hits = index.search("query", 3).await.unwrap();
    let order: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
    assert_eq!(order, vec!["near", "middle", "far"]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[tokio::test]
async fn test_unknown_query_vector_is_embedding_error() {
    let dir = TempDir::new().unwrap();
    let provider = LookupProvider::new(&[("known", [1.0, 0.0, 0.0, 0.0])]);
    let mut index = VectorIndex::new(dir.path(), provider);
    index
        .add(&strings(&["known"]), &[ChunkMetadata::new("x")])
        .await
        .unwrap();

    assert!(matches!(
        index.search("unknown", 1).await,
        Err(AppError::Embedding(_))
    ));
}
