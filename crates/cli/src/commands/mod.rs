//! Command handlers for the Docent CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod eval;
pub mod ingest;
pub mod search;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use eval::EvalCommand;
pub use ingest::IngestCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;

use docent_core::{config::AppConfig, AppResult};
use serde::Serialize;

/// Key for OpenAI-backed knowledge features (embeddings, transcription).
pub(crate) fn knowledge_api_key(config: &AppConfig) -> Option<String> {
    config.resolve_api_key("openai")
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
