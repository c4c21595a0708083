//! In-memory vector index with a process-wide build-once cache.
//!
//! The index is built from the full corpus at most once per process and
//! is read-only afterwards. A failed build (missing or empty corpus,
//! embedding failure) is cached as "no index" so the pipeline degrades to
//! generation-only mode instead of crashing or rebuilding every turn.

use crate::chunker::{chunk_text, Chunk};
use crate::document::load_document;
use crate::embeddings::EmbeddingProvider;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tutor_core::{AppError, AppResult};

/// One indexed chunk with its embedding.
#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// Read-only vector index over the corpus chunks.
///
/// All vectors share the embedding model and dimension recorded at build
/// time; queries from a different embedding space are rejected.
pub struct CorpusIndex {
    entries: Vec<IndexEntry>,
    model: String,
    dimensions: usize,
}

impl CorpusIndex {
    /// Build an index by embedding every chunk.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> AppResult<CorpusIndex> {
        if chunks.is_empty() {
            return Err(AppError::Knowledge(
                "Cannot build an index from zero chunks".to_string(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        if vectors.len() != chunks.len() {
            return Err(AppError::Knowledge(format!(
                "Embedded {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let dimensions = embedder.dimensions();
        for vector in &vectors {
            if vector.len() != dimensions {
                return Err(AppError::Knowledge(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    dimensions,
                    vector.len()
                )));
            }
        }

        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect::<Vec<_>>();

        tracing::info!(
            "Built corpus index: {} chunks, model {}, {} dimensions",
            entries.len(),
            embedder.model_name(),
            dimensions
        );

        Ok(CorpusIndex {
            entries,
            model: embedder.model_name().to_string(),
            dimensions,
        })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding model the index was built with.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embedding dimensionality.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Retrieve up to `k` chunks nearest to the query text.
    ///
    /// Results are ordered by descending cosine similarity; ties break by
    /// ascending chunk index, so equally-near chunks come back in reading
    /// order.
    pub async fn query(
        &self,
        text: &str,
        embedder: &dyn EmbeddingProvider,
        k: usize,
    ) -> AppResult<Vec<(Chunk, f32)>> {
        if embedder.model_name() != self.model {
            return Err(AppError::Knowledge(format!(
                "Embedding space mismatch: index built with {}, query uses {}",
                self.model,
                embedder.model_name()
            )));
        }

        let query_vector = embedder.embed(text).await?;
        if query_vector.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query dimension mismatch: expected {}, got {}",
                self.dimensions,
                query_vector.len()
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_similarity(&entry.vector, &query_vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(self.entries[a.0].chunk.index.cmp(&self.entries[b.0].chunk.index))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| (self.entries[pos].chunk.clone(), score))
            .collect())
    }
}

/// Cosine similarity between two vectors of equal length.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Process-wide, write-once index cache.
///
/// Shared across sessions; the single `get_or_build` initialisation is
/// the only cross-session mutation, after which all access is read-only.
pub struct IndexCache {
    cell: OnceCell<Option<Arc<CorpusIndex>>>,
}

impl IndexCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Get the cached index, building it on first call.
    ///
    /// Ingestion and build failures are logged and cached as `None`:
    /// retrieval stays disabled for the process lifetime and the caller
    /// continues in generation-only mode. Subsequent calls perform no
    /// additional ingestion or embedding work.
    pub async fn get_or_build(
        &self,
        corpus_path: &Path,
        chunk_size: usize,
        chunk_overlap: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Option<Arc<CorpusIndex>> {
        self.cell
            .get_or_init(|| async {
                match build_index(corpus_path, chunk_size, chunk_overlap, embedder).await {
                    Ok(index) => Some(Arc::new(index)),
                    Err(err) => {
                        tracing::warn!(
                            error = %err,
                            "Index build failed; continuing without retrieval"
                        );
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// The cached index, if the build already ran and succeeded.
    pub fn get(&self) -> Option<Arc<CorpusIndex>> {
        self.cell.get().cloned().flatten()
    }
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Load, chunk, and embed the corpus.
async fn build_index(
    corpus_path: &Path,
    chunk_size: usize,
    chunk_overlap: usize,
    embedder: &dyn EmbeddingProvider,
) -> AppResult<CorpusIndex> {
    let document = load_document(corpus_path)?;
    let chunks = chunk_text(&document.text, chunk_size, chunk_overlap)?;
    CorpusIndex::build(chunks, embedder).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::TrigramEmbedder;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedder wrapper that counts embedding calls.
    #[derive(Debug)]
    struct CountingEmbedder {
        inner: TrigramEmbedder,
        calls: AtomicUsize,
    }

    impl CountingEmbedder {
        fn new() -> Self {
            Self {
                inner: TrigramEmbedder::default(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingEmbedder {
        fn provider_name(&self) -> &str {
            self.inner.provider_name()
        }

        fn model_name(&self) -> &str {
            self.inner.model_name()
        }

        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            self.inner.embed_batch(texts).await
        }
    }

    fn sample_chunks() -> Vec<Chunk> {
        [
            "Xenia, the guest-friendship of the Greeks, binds host and stranger.",
            "Penelope weaves and unweaves the shroud to delay the suitors.",
            "Gilgamesh mourns Enkidu and sets out to find everlasting life.",
            "Sundiata gathers the twelve kingdoms into the empire of Mali.",
        ]
        .iter()
        .enumerate()
        .map(|(i, text)| Chunk {
            index: i as u32,
            offset: i * 100,
            text: text.to_string(),
        })
        .collect()
    }

    #[tokio::test]
    async fn test_build_and_query_ranking() {
        let embedder = TrigramEmbedder::default();
        let index = CorpusIndex::build(sample_chunks(), &embedder).await.unwrap();

        assert_eq!(index.len(), 4);
        assert_eq!(index.dimensions(), 384);

        let results = index
            .query("who weaves the shroud for Laertes?", &embedder, 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].0.text.contains("Penelope"));
        // Scores are non-increasing
        assert!(results[0].1 >= results[1].1);
    }

    #[tokio::test]
    async fn test_query_respects_k_bound() {
        let embedder = TrigramEmbedder::default();
        let index = CorpusIndex::build(sample_chunks(), &embedder).await.unwrap();

        let results = index.query("epic poetry", &embedder, 10).await.unwrap();
        assert!(results.len() <= 4);

        let results = index.query("epic poetry", &embedder, 1).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_ties_resolve_to_document_order() {
        let embedder = TrigramEmbedder::default();
        // Identical chunks embed identically, so every score ties.
        let chunks: Vec<Chunk> = (0..3)
            .map(|i| Chunk {
                index: i,
                offset: i as usize * 10,
                text: "identical text".to_string(),
            })
            .collect();

        let index = CorpusIndex::build(chunks, &embedder).await.unwrap();
        let results = index.query("identical text", &embedder, 3).await.unwrap();

        let order: Vec<u32> = results.iter().map(|(c, _)| c.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_query_rejects_mismatched_embedding_space() {
        let embedder = TrigramEmbedder::default();
        let index = CorpusIndex::build(sample_chunks(), &embedder).await.unwrap();

        let other = TrigramEmbedder::new(128);
        // Same model name but different dimensions would be caught too;
        // here we check the model-name guard with a differently-sized
        // vector from a hand-rolled embedder.
        #[derive(Debug)]
        struct OtherModel;

        #[async_trait::async_trait]
        impl EmbeddingProvider for OtherModel {
            fn provider_name(&self) -> &str {
                "other"
            }
            fn model_name(&self) -> &str {
                "other-v1"
            }
            fn dimensions(&self) -> usize {
                384
            }
            async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
                Ok(texts.iter().map(|_| vec![0.0; 384]).collect())
            }
        }

        let err = index.query("query", &OtherModel, 2).await.unwrap_err();
        assert!(matches!(err, AppError::Knowledge(_)));
        drop(other);
    }

    #[tokio::test]
    async fn test_cache_builds_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", "The Odyssey opens in Ithaca. ".repeat(40)).unwrap();

        let cache = IndexCache::new();
        let embedder = CountingEmbedder::new();

        let first = cache
            .get_or_build(file.path(), 200, 50, &embedder)
            .await
            .expect("index should build");
        let calls_after_first = embedder.calls();
        assert!(calls_after_first > 0);

        let second = cache
            .get_or_build(file.path(), 200, 50, &embedder)
            .await
            .expect("cached index");

        // Second call is a no-op: same index, zero additional embeddings.
        assert_eq!(embedder.calls(), calls_after_first);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_missing_corpus_caches_degrade_mode() {
        let cache = IndexCache::new();
        let embedder = CountingEmbedder::new();

        let result = cache
            .get_or_build(Path::new("/nonexistent/guide.txt"), 200, 50, &embedder)
            .await;

        assert!(result.is_none());
        assert_eq!(embedder.calls(), 0);

        // The failure itself is cached; no retry on the next call.
        let again = cache
            .get_or_build(Path::new("/nonexistent/guide.txt"), 200, 50, &embedder)
            .await;
        assert!(again.is_none());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
