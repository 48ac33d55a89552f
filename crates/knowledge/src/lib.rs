//! Multi-modal knowledge bases.
//!
//! Files (PDF, images, audio, text, Markdown, CSV) are extracted into text
//! chunks, embedded, and kept in a persistent vector index under
//! `.docent/knowledge/<base>/`. Queries return the most similar chunks with
//! source and page attribution, optionally synthesized into an answer.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod evaluation;
pub mod extract;
pub mod rag;
pub mod retriever;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::Chunker;
pub use embeddings::{EmbeddingConfig, EmbeddingProvider, LazyProvider};
pub use evaluation::{evaluate_retrieval, RetrievalEvaluation};
pub use extract::{Capabilities, Extractors, FileKind};
pub use rag::{RagResponse, RagSourceRef};
pub use retriever::{Retriever, RetrieverState};
pub use types::{
    BaseStats, Chunk, ChunkCandidate, ChunkMetadata, FileOutcome, IngestReport,
    KnowledgeBaseConfig, SearchHit,
};
pub use vector_index::VectorIndex;

use docent_core::AppResult;
use docent_llm::LlmClient;
use docent_prompt::{load_prompt, RAG_ANSWER_PROMPT_ID};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Build an unloaded retriever for a knowledge base from its config.
///
/// `api_key` is used for OpenAI embeddings and Whisper transcription.
pub fn build_retriever(
    workspace: &Path,
    config: &KnowledgeBaseConfig,
    api_key: Option<&str>,
) -> AppResult<Retriever> {
    let provider = Arc::new(LazyProvider::new(
        EmbeddingConfig::from(config),
        api_key.map(str::to_string),
    ));
    let capabilities = Capabilities::detect(config, api_key);
    let extractors = Extractors::from_config(config, capabilities)?;

    Ok(Retriever::new(
        config::get_index_dir(workspace, &config.name),
        provider,
        extractors,
    ))
}

/// Open a knowledge base, loading its persisted index if any.
pub fn open_retriever(
    workspace: &Path,
    base_name: &str,
    api_key: Option<&str>,
) -> AppResult<Retriever> {
    let config = config::load_config(workspace, base_name)?;
    let mut retriever = build_retriever(workspace, &config, api_key)?;
    retriever.load()?;
    Ok(retriever)
}

/// Ingest files and directories into a knowledge base.
///
/// Saves the base config on first use. The index itself is only written
/// once a file yields chunks. Individual file failures are reported in the
/// returned [`IngestReport`].
pub async fn ingest(
    workspace: &Path,
    base_name: &str,
    paths: &[PathBuf],
    api_key: Option<&str>,
) -> AppResult<IngestReport> {
    tracing::info!("Ingesting {} paths into '{}'", paths.len(), base_name);

    let config = config::load_config(workspace, base_name)?;
    if !config::get_config_path(workspace, base_name).exists() {
        config::save_config(workspace, &config)?;
    }

    let mut retriever = build_retriever(workspace, &config, api_key)?;
    retriever.load()?;
    if !retriever.ocr_available() && config.ocr_enabled {
        tracing::warn!("OCR tools not found; pages without a text layer will be skipped");
    }

    retriever.add_files(paths).await
}

/// Top-`k` chunks for a query.
pub async fn search(
    workspace: &Path,
    base_name: &str,
    query: &str,
    k: usize,
    api_key: Option<&str>,
) -> AppResult<Vec<SearchHit>> {
    tracing::info!("Searching '{}' (k={}): {}", base_name, k, query);

    let retriever = open_retriever(workspace, base_name, api_key)?;
    retriever.retrieve(query, k).await
}

/// Answer a question from a knowledge base using the `rag.answer` prompt.
pub async fn ask(
    workspace: &Path,
    base_name: &str,
    question: &str,
    k: usize,
    client: &dyn LlmClient,
    model: &str,
    api_key: Option<&str>,
) -> AppResult<RagResponse> {
    let retriever = open_retriever(workspace, base_name, api_key)?;
    let prompt = load_prompt(workspace, RAG_ANSWER_PROMPT_ID)?;
    rag::ask_rag(&retriever, client, &prompt, model, question, k).await
}

/// Retrieve for `query` and score the hits against an expected keyword.
pub async fn evaluate(
    workspace: &Path,
    base_name: &str,
    query: &str,
    ground_truth: &str,
    k: usize,
    api_key: Option<&str>,
) -> AppResult<RetrievalEvaluation> {
    let hits = search(workspace, base_name, query, k, api_key).await?;
    Ok(evaluate_retrieval(query, &hits, ground_truth))
}

/// Get statistics for a knowledge base. Never touches the network.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    tracing::info!("Getting stats for knowledge base '{}'", base_name);

    let config = config::load_config(workspace, base_name)?;
    let provider = Arc::new(LazyProvider::new(EmbeddingConfig::from(&config), None));
    let index_dir = config::get_index_dir(workspace, base_name);

    let mut stats = BaseStats {
        base_name: base_name.to_string(),
        exists: config::get_config_path(workspace, base_name).exists(),
        indexed: false,
        chunks_count: 0,
        sources_count: 0,
        dimension: None,
        snapshot_size_bytes: 0,
        provider: config.provider.clone(),
        model: config.model.clone(),
    };

    if let Some(index) = VectorIndex::load(&index_dir, provider)? {
        stats.indexed = true;
        stats.chunks_count = index.len();
        stats.sources_count = index
            .chunks()
            .iter()
            .map(|c| c.metadata.source.as_str())
            .collect::<HashSet<_>>()
            .len();
        stats.dimension = index.dimension();
        stats.snapshot_size_bytes = std::fs::metadata(index.snapshot_path())
            .map(|m| m.len())
            .unwrap_or(0);
    }

    Ok(stats)
}

#[cfg(test)]
mod lib_tests {
    use super::*;
    use docent_core::AppError;
    use tempfile::TempDir;

    fn offline_base(workspace: &Path, name: &str) {
        let config = KnowledgeBaseConfig {
            name: name.to_string(),
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            embedding_dim: 256,
            ocr_enabled: false,
            ..Default::default()
        };
        config::save_config(workspace, &config).unwrap();
    }

    #[tokio::test]
    async fn test_ingest_search_and_stats() {
        let workspace = TempDir::new().unwrap();
        offline_base(workspace.path(), "docs");

        let docs = workspace.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        std::fs::write(docs.join("a.txt"), "The sky is blue.").unwrap();
        std::fs::write(docs.join("b.txt"), "Grass is green.").unwrap();

        let report = ingest(workspace.path(), "docs", &[docs.clone()], None)
            .await
            .unwrap();
        assert_eq!(report.chunks_added, 2);
        assert_eq!(report.failed, 0);

        let hits = search(workspace.path(), "docs", "sky", 1, None).await.unwrap();
        assert!(hits[0].metadata.source.ends_with("a.txt"));

        let stats = stats(workspace.path(), "docs").unwrap();
        assert!(stats.exists);
        assert!(stats.indexed);
        assert_eq!(stats.chunks_count, 2);
        assert_eq!(stats.sources_count, 2);
        assert_eq!(stats.dimension, Some(256));
        assert!(stats.snapshot_size_bytes > 0);
        assert_eq!(stats.provider, "trigram");
    }

    #[tokio::test]
    async fn test_unknown_base_is_empty() {
        let workspace = TempDir::new().unwrap();

        let stats = stats(workspace.path(), "missing").unwrap();
        assert!(!stats.exists);
        assert!(!stats.indexed);
        assert_eq!(stats.chunks_count, 0);

        assert!(matches!(
            search(workspace.path(), "missing", "anything", 3, None).await,
            Err(AppError::EmptyIndex(_))
        ));
    }

    #[tokio::test]
    async fn test_ingest_saves_config_but_no_index_without_chunks() {
        let workspace = TempDir::new().unwrap();

        let report = ingest(workspace.path(), "fresh", &[], None).await.unwrap();
        assert!(report.files.is_empty());

        let stats = stats(workspace.path(), "fresh").unwrap();
        assert!(stats.exists);
        assert!(!stats.indexed);
        assert_eq!(stats.dimension, None);
        assert!(!config::get_index_dir(workspace.path(), "fresh")
            .join(vector_index::SNAPSHOT_FILE)
            .exists());
    }

    #[tokio::test]
    async fn test_ingest_of_unsupported_file_writes_no_index() {
        let workspace = TempDir::new().unwrap();
        offline_base(workspace.path(), "kb");
        let docx = workspace.path().join("contract.docx");
        std::fs::write(&docx, "PK fake office document").unwrap();

        let report = ingest(workspace.path(), "kb", &[docx], None).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.chunks_added, 0);

        let snapshot = config::get_index_dir(workspace.path(), "kb").join(vector_index::SNAPSHOT_FILE);
        assert!(!snapshot.exists());
        assert!(!stats(workspace.path(), "kb").unwrap().indexed);
    }

    #[tokio::test]
    async fn test_evaluate_counts_keyword_hits() {
        let workspace = TempDir::new().unwrap();
        offline_base(workspace.path(), "eval");
        let file = workspace.path().join("sky.txt");
        std::fs::write(&file, "The sky is blue.").unwrap();
        ingest(workspace.path(), "eval", &[file], None).await.unwrap();

        let result = evaluate(workspace.path(), "eval", "sky color", "BLUE", 3, None)
            .await
            .unwrap();
        assert_eq!(result.docs_retrieved, 1);
        assert_eq!(result.recall_at_k, 1.0);
    }
}
