//! Text chunking with configurable size and overlap.
//!
//! Windows are measured in characters, not bytes, so consecutive chunks
//! share exactly `overlap` characters regardless of UTF-8 width. The
//! trailing partial chunk is always kept.

use tutor_core::{AppError, AppResult};

/// A contiguous slice of the corpus document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Sequence index within the document (reading order)
    pub index: u32,

    /// Byte offset of the chunk start in the source text
    pub offset: usize,

    /// Chunk text
    pub text: String,
}

/// Chunk text into overlapping segments.
///
/// Consecutive chunks overlap by `overlap` characters; the window slides
/// by `max_size - overlap`. Pure and deterministic.
///
/// # Errors
/// `AppError::Config` when `overlap >= max_size` or `max_size == 0`.
pub fn chunk_text(text: &str, max_size: usize, overlap: usize) -> AppResult<Vec<Chunk>> {
    if max_size == 0 {
        return Err(AppError::Config("chunk size must be positive".to_string()));
    }
    if overlap >= max_size {
        return Err(AppError::Config(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, max_size
        )));
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }

    // Byte offsets of every char boundary, plus the end of the text.
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());
    let char_count = boundaries.len() - 1;

    let step = max_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0u32;

    while start < char_count {
        let end = (start + max_size).min(char_count);
        let byte_start = boundaries[start];
        let byte_end = boundaries[end];

        chunks.push(Chunk {
            index,
            offset: byte_start,
            text: text[byte_start..byte_end].to_string(),
        });

        index += 1;

        if end == char_count {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        char_count,
        chunks.len(),
        max_size,
        overlap
    );

    Ok(chunks)
}
