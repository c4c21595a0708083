//! One-shot ask command.

use crate::session::ChatSession;
use clap::Args;
use std::sync::Arc;
use tutor_core::{AppConfig, AppResult};
use tutor_knowledge::IndexCache;

/// Ask a single question without an interactive session
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let cache = Arc::new(IndexCache::new());
        let mut session = ChatSession::from_config(config, cache)?;

        let answer = session.handle_turn(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": answer,
                "model": config.model,
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer);
        }

        Ok(())
    }
}
