//! Local trigram embedding provider.

use crate::embeddings::EmbeddingProvider;
use tutor_core::AppResult;

/// Default dimensionality of trigram embeddings.
const TRIGRAM_DIMENSIONS: usize = 384;

/// Trigram-based embedding provider for local, offline operation.
///
/// Generates deterministic embeddings from character trigrams and word
/// frequencies. Not semantically accurate like a neural model, but
/// consistent and content-dependent, with no network I/O and no quota.
#[derive(Debug)]
pub struct TrigramEmbedder {
    dimensions: usize,
}

impl TrigramEmbedder {
    /// Create a new trigram embedder with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Generate a trigram-based embedding for text.
    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let lower = text.to_lowercase();

        // Filter stop words for better discrimination
        let stop_words: std::collections::HashSet<&str> = [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
            "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have",
            "has", "had", "it", "its", "their", "they", "them",
        ]
        .iter()
        .copied()
        .collect();

        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
            .collect();

        let mut word_freq = std::collections::HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0) += 1;
        }

        // Map each unique word to multiple dimensions based on character
        // trigrams, plus one dimension for the whole word.
        for (word, freq) in word_freq.iter() {
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!("{}{}{}", chars[i], chars[i + 1], chars[i + 2]);
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

impl Default for TrigramEmbedder {
    fn default() -> Self {
        Self::new(TRIGRAM_DIMENSIONS)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramEmbedder {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| self.generate_embedding(text))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimensions_and_names() {
        let embedder = TrigramEmbedder::default();
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.provider_name(), "trigram");
        assert_eq!(embedder.model_name(), "trigram-v1");
    }

    #[tokio::test]
    async fn test_embeddings_are_unit_vectors() {
        let embedder = TrigramEmbedder::default();
        let embedding = embedder.embed("hospitality toward strangers").await.unwrap();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let embedder = TrigramEmbedder::default();
        let texts = vec![
            "xenia and hospitality".to_string(),
            "the loom of Penelope".to_string(),
        ];

        let batch = embedder.embed_batch(&texts).await.unwrap();
        let first = embedder.embed(&texts[0]).await.unwrap();
        let second = embedder.embed(&texts[1]).await.unwrap();

        assert_eq!(batch[0], first);
        assert_eq!(batch[1], second);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = TrigramEmbedder::default();
        let a = embedder.embed("deterministic test").await.unwrap();
        let b = embedder.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_different_texts_differ() {
        let embedder = TrigramEmbedder::default();
        let a = embedder.embed("Odysseus the wanderer").await.unwrap();
        let b = embedder.embed("Gilgamesh of Uruk").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = TrigramEmbedder::default();
        let embedding = embedder.embed("").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }
}
