//! Free-text retrieval over the cached corpus index.
//!
//! `retrieve` never errors: when no index is available (ingestion failed
//! or was skipped) or the query embedding fails, it returns an empty
//! context string and the tutor answers without reference snippets.

use crate::embeddings::EmbeddingProvider;
use crate::index::IndexCache;
use std::path::PathBuf;
use std::sync::Arc;

/// Separator between retrieved chunk texts in the context string.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Retriever: query embedding + top-k lookup + context assembly.
pub struct Retriever {
    cache: Arc<IndexCache>,
    embedder: Arc<dyn EmbeddingProvider>,
    corpus_path: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    top_k: usize,
}

impl Retriever {
    pub fn new(
        cache: Arc<IndexCache>,
        embedder: Arc<dyn EmbeddingProvider>,
        corpus_path: PathBuf,
        chunk_size: usize,
        chunk_overlap: usize,
        top_k: usize,
    ) -> Self {
        Self {
            cache,
            embedder,
            corpus_path,
            chunk_size,
            chunk_overlap,
            top_k,
        }
    }

    /// Retrieve context text for a query.
    ///
    /// Builds the index lazily on first use. Returns matched chunk texts
    /// in rank order joined by a visible separator, or an empty string in
    /// degrade mode.
    pub async fn retrieve(&self, query: &str) -> String {
        let index = match self
            .cache
            .get_or_build(
                &self.corpus_path,
                self.chunk_size,
                self.chunk_overlap,
                self.embedder.as_ref(),
            )
            .await
        {
            Some(index) => index,
            None => {
                tracing::debug!("No corpus index available; returning empty context");
                return String::new();
            }
        };

        match index.query(query, self.embedder.as_ref(), self.top_k).await {
            Ok(results) => {
                tracing::debug!("Retrieved {} chunks for query", results.len());
                results
                    .into_iter()
                    .map(|(chunk, _score)| chunk.text)
                    .collect::<Vec<_>>()
                    .join(CONTEXT_SEPARATOR)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Retrieval failed; returning empty context");
                String::new()
            }
        }
    }
}
