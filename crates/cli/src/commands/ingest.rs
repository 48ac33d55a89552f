//! Ingest command handler.

use super::{knowledge_api_key, print_json};
use clap::Args;
use docent_core::{config::AppConfig, AppResult};
use std::path::PathBuf;

/// Add files or directories to a knowledge base
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Knowledge base name
    pub base: String,

    /// Files or directories to ingest
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for base '{}'", self.base);

        let api_key = knowledge_api_key(config);
        let report =
            docent_knowledge::ingest(&config.workspace, &self.base, &self.paths, api_key.as_deref())
                .await?;

        if self.json {
            return print_json(&report);
        }

        for file in &report.files {
            match &file.error {
                None => println!("  ok      {} ({} chunks)", file.path.display(), file.chunks_added),
                Some(error) => println!("  failed  {}: {}", file.path.display(), error),
            }
        }
        println!(
            "Ingested {} files into '{}' ({} failed): {} chunks in {:.2}s",
            report.files.len(),
            self.base,
            report.failed,
            report.chunks_added,
            report.duration_secs
        );

        Ok(())
    }
}
