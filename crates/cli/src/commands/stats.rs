//! Stats command handler.
//!
//! Shows what a knowledge base holds without contacting any provider.

use super::print_json;
use clap::Args;
use docent_core::{config::AppConfig, AppResult};

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Knowledge base name
    pub base: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command for base '{}'", self.base);

        let stats = docent_knowledge::stats(&config.workspace, &self.base)?;

        if self.json {
            return print_json(&stats);
        }

        println!("Knowledge base: {}", stats.base_name);
        if !stats.exists {
            println!("  (no such base)");
        } else if !stats.indexed {
            println!("  (no index yet: nothing ingested)");
        }
        println!("  Sources: {}", stats.sources_count);
        println!("  Chunks: {}", stats.chunks_count);
        match stats.dimension {
            Some(dim) => println!("  Dimension: {}", dim),
            None => println!("  Dimension: (not fixed yet)"),
        }
        println!("  Embeddings: {} / {}", stats.provider, stats.model);
        println!("  Snapshot size: {} bytes", stats.snapshot_size_bytes);

        Ok(())
    }
}
