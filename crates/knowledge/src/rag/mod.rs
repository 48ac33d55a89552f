//! RAG (Retrieval-Augmented Generation) answering system.
//!
//! Provides natural language answering over knowledge bases using LLM synthesis.

pub mod ask;
pub mod tools;
pub mod types;

pub use ask::ask_rag;
pub use tools::{count_docs, search_docs, summarize_docs};
pub use types::{RagResponse, RagSourceRef};
