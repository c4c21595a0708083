//! Corpus inspection command.
//!
//! Builds (or reuses) the corpus index and reports its shape, or reports
//! degrade mode when the corpus cannot be ingested.

use clap::Args;
use std::sync::Arc;
use tutor_core::{AppConfig, AppResult};
use tutor_knowledge::{create_embedder, IndexCache};

/// Inspect the corpus index
#[derive(Args, Debug)]
pub struct CorpusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CorpusCommand {
    /// Execute the corpus command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let api_key = config.resolve_api_key();

        let embedder = create_embedder(
            &config.embedding_provider,
            &config.embedding_model,
            config.endpoint.as_deref(),
            api_key.as_deref(),
        )?;

        let cache = Arc::new(IndexCache::new());
        let index = cache
            .get_or_build(
                &config.corpus_path,
                config.chunk_size,
                config.chunk_overlap,
                embedder.as_ref(),
            )
            .await;

        match index {
            Some(index) => {
                if self.json {
                    let output = serde_json::json!({
                        "corpus": config.corpus_path,
                        "chunks": index.len(),
                        "embeddingModel": index.model(),
                        "dimensions": index.dimensions(),
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                } else {
                    println!("Corpus: {}", config.corpus_path.display());
                    println!("Chunks: {}", index.len());
                    println!(
                        "Embedding model: {} ({} dimensions)",
                        index.model(),
                        index.dimensions()
                    );
                }
            }
            None => {
                println!(
                    "No corpus index available for {}; the tutor runs in generation-only mode.",
                    config.corpus_path.display()
                );
            }
        }

        Ok(())
    }
}
