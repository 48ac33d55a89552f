//! Cross-module tests: ingestion scenarios and ranking.

mod rag_ranking;
mod support;
