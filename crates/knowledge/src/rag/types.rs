//! RAG response types.

use crate::types::ChunkMetadata;
use serde::{Deserialize, Serialize};

/// A single source reference used to answer a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSourceRef {
    /// Source path as it was ingested
    pub source: String,

    /// 1-based page for paginated sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Short snippet showing the relevant evidence (truncated if needed)
    pub snippet: String,
}

impl RagSourceRef {
    /// Citation label, e.g. `report.pdf (p.2)`.
    pub fn citation(&self) -> String {
        ChunkMetadata {
            source: self.source.clone(),
            page: self.page,
        }
        .citation()
    }
}

/// Response from a RAG answering query.
///
/// Contains a natural language answer synthesized by an LLM,
/// along with the sources it was grounded on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Natural language answer synthesized by the LLM
    pub answer: String,

    /// Sources used to generate the answer, in rank order
    pub sources: Vec<RagSourceRef>,
}

impl RagResponse {
    pub fn new(answer: impl Into<String>, sources: Vec<RagSourceRef>) -> Self {
        Self {
            answer: answer.into(),
            sources,
        }
    }

    /// Answer followed by a `**Sources:**` line listing the citations.
    pub fn render(&self) -> String {
        if self.sources.is_empty() {
            return self.answer.clone();
        }
        let citations: Vec<String> = self.sources.iter().map(RagSourceRef::citation).collect();
        format!("{}\n\n**Sources:** {}", self.answer.trim_end(), citations.join(", "))
    }
}
