//! Embedding providers for corpus chunks and queries.
//!
//! One capability trait, two conforming implementations selected by
//! configuration at startup: a remote Gemini backend and a local,
//! deterministic trigram backend for offline operation.

pub mod gemini;
pub mod trigram;

pub use gemini::GeminiEmbedder;
pub use trigram::TrigramEmbedder;

use std::sync::Arc;
use tutor_core::{AppError, AppResult};

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "gemini", "trigram")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch, order-preserving.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_embedder(
    provider: &str,
    model: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Gemini embedding provider requires an API key".to_string())
            })?;

            let embedder = match endpoint {
                Some(base_url) => GeminiEmbedder::with_base_url(api_key, model, base_url),
                None => GeminiEmbedder::new(api_key, model),
            };
            Ok(Arc::new(embedder))
        }

        "trigram" => Ok(Arc::new(TrigramEmbedder::default())),

        other => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: gemini, trigram",
            other
        ))),
    }
}
