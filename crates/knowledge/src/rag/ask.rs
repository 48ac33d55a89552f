//! RAG answering orchestration.
//!
//! Retrieves relevant chunks and generates a grounded answer via the LLM.

use crate::rag::tools::truncate_chars;
use crate::rag::types::{RagResponse, RagSourceRef};
use crate::retriever::Retriever;
use crate::types::SearchHit;
use docent_core::{AppError, AppResult};
use docent_llm::{LlmClient, LlmRequest};
use docent_prompt::{build_prompt, PromptDefinition};
use std::collections::{HashMap, HashSet};

/// Maximum snippet length for source references.
const MAX_SNIPPET_CHARS: usize = 150;

/// Ask a question and generate an answer from the top-`k` chunks.
///
/// The prompt definition must declare `context` and `question` variables.
/// Generation runs at temperature 0.
pub async fn ask_rag(
    retriever: &Retriever,
    client: &dyn LlmClient,
    prompt: &PromptDefinition,
    model: &str,
    question: &str,
    k: usize,
) -> AppResult<RagResponse> {
    tracing::info!("RAG answering with k={}: {}", k, question);

    let hits = retriever.retrieve(question, k).await?;
    tracing::debug!(
        "Retrieved {} chunks (top score: {:.3})",
        hits.len(),
        hits.first().map(|h| h.score).unwrap_or(0.0)
    );

    let mut variables = HashMap::new();
    variables.insert("context".to_string(), build_context(&hits));
    variables.insert("question".to_string(), question.to_string());
    let built = build_prompt(prompt, variables)?;

    let mut request = LlmRequest::new(built.user, model).with_temperature(0.0);
    if let Some(system) = built.system {
        request = request.with_system(system);
    }

    let response = client
        .complete(&request)
        .await
        .map_err(|e| match e {
            AppError::Llm(_) => e,
            other => AppError::Llm(format!("Answer generation failed: {}", other)),
        })?;

    Ok(RagResponse::new(response.content.trim(), map_hits_to_sources(&hits)))
}

/// Build the context block, each chunk prefixed with its citation label.
fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("[{}]\n{}", hit.metadata.citation(), hit.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// One reference per distinct (source, page), in rank order.
fn map_hits_to_sources(hits: &[SearchHit]) -> Vec<RagSourceRef> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter(|hit| seen.insert((hit.metadata.source.clone(), hit.metadata.page)))
        .map(|hit| RagSourceRef {
            source: hit.metadata.source.clone(),
            page: hit.metadata.page,
            snippet: truncate_chars(hit.text.trim(), MAX_SNIPPET_CHARS),
        })
        .collect()
}
