//! Error types for Docent.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application: configuration, I/O, LLM, prompts, and the typed
//! failures of the ingestion and retrieval pipeline.

use thiserror::Error;

/// Unified error type for Docent.
///
/// All functions in the application return `Result<T, AppError>`.
/// Nothing in the pipeline is process-fatal: every failure is represented
/// here so the caller can branch on it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge base errors that do not fit a more specific variant
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Unrecognized or undecodable input file. Reported directly, never retried.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Extractor-internal failure. The file is skipped, a batch continues.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Speech-to-text failed or produced no text.
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Embedding provider failure. Aborts the current add call entirely.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A snapshot exists but is corrupted or incompatible.
    #[error("Index load error: {0}")]
    IndexLoad(String),

    /// Query against an index holding zero chunks.
    #[error("Index is empty: {0}")]
    EmptyIndex(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_category() {
        let err = AppError::UnsupportedInput("extension '.docx'".to_string());
        assert_eq!(err.to_string(), "Unsupported input: extension '.docx'");

        let err = AppError::EmptyIndex("no chunks".to_string());
        assert!(err.to_string().starts_with("Index is empty"));
    }

    #[test]
    fn test_json_error_maps_to_serialization() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: AppError = parse_err.into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
