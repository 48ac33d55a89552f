//! Eval command handler.

use super::{knowledge_api_key, print_json};
use clap::Args;
use docent_core::{config::AppConfig, AppResult};

/// Check whether retrieved chunks contain an expected keyword
#[derive(Args, Debug)]
pub struct EvalCommand {
    /// Knowledge base name
    pub base: String,

    /// Query text
    pub query: String,

    /// Keyword the retrieved chunks should contain
    #[arg(long = "expect")]
    pub ground_truth: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "3")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl EvalCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing eval command for base '{}'", self.base);

        let api_key = knowledge_api_key(config);
        let result = docent_knowledge::evaluate(
            &config.workspace,
            &self.base,
            &self.query,
            &self.ground_truth,
            self.top_k,
            api_key.as_deref(),
        )
        .await?;

        if self.json {
            return print_json(&result);
        }

        println!("Query:          {}", result.query);
        println!("Expected:       {}", result.ground_truth);
        println!("Recall@{}:       {:.2}", self.top_k, result.recall_at_k);
        println!("Docs retrieved: {}", result.docs_retrieved);

        Ok(())
    }
}
