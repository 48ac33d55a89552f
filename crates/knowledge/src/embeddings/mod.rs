//! Embedding engine for knowledge bases.
//!
//! Provides provider-agnostic embedding generation with per-base configuration.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider, LazyProvider};
