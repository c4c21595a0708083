//! Corpus ingestion and retrieval for the tutor CLI.
//!
//! The pipeline is: load the corpus document once, split it into
//! overlapping chunks, embed every chunk, and hold the result in a
//! process-wide write-once index. The retriever then answers free-text
//! queries with the top-k matching chunk texts, or an empty context when
//! the index could not be built (degrade mode).

pub mod chunker;
pub mod document;
pub mod embeddings;
pub mod index;
pub mod retriever;

// Re-export commonly used types
pub use chunker::{chunk_text, Chunk};
pub use document::{load_document, Document};
pub use embeddings::{create_embedder, EmbeddingProvider};
pub use index::{CorpusIndex, IndexCache};
pub use retriever::Retriever;
