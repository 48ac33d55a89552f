//! Search command handler.

use super::{knowledge_api_key, print_json};
use clap::Args;
use docent_core::{config::AppConfig, AppResult};

/// Retrieve the chunks most similar to a query
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Knowledge base name
    pub base: String,

    /// Query text
    pub query: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "3")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command for base '{}'", self.base);

        let api_key = knowledge_api_key(config);
        let hits = docent_knowledge::search(
            &config.workspace,
            &self.base,
            &self.query,
            self.top_k,
            api_key.as_deref(),
        )
        .await?;

        if self.json {
            return print_json(&hits);
        }

        for hit in &hits {
            println!("{}. [{:.3}] {}", hit.rank, hit.score, hit.metadata.citation());
            for line in hit.text.trim().lines() {
                println!("   {}", line);
            }
            println!();
        }

        Ok(())
    }
}
