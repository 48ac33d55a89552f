//! Ask command handler.
//!
//! Answers a question from a knowledge base with source citations.

use super::{knowledge_api_key, print_json};
use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use docent_llm::create_client;

/// Answer a question using a knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Knowledge base name
    pub base: String,

    /// The question to ask
    pub question: String,

    /// Number of chunks used as context
    #[arg(short = 'k', long, default_value = "3")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command for base '{}'", self.base);
        config.validate()?;

        let llm_key = config.resolve_api_key(&config.provider);
        let endpoint = config
            .get_provider_config(&config.provider)
            .and_then(|p| p.endpoint());
        let client = create_client(&config.provider, endpoint, llm_key.as_deref())?;

        let knowledge_key = knowledge_api_key(config);
        let response = docent_knowledge::ask(
            &config.workspace,
            &self.base,
            &self.question,
            self.top_k,
            client.as_ref(),
            &config.model,
            knowledge_key.as_deref(),
        )
        .await?;

        tracing::debug!("Answer grounded on {} sources", response.sources.len());

        if self.json {
            return print_json(&response);
        }

        println!("{}", response.render());
        Ok(())
    }
}
