//! Corpus document loading.
//!
//! The corpus is a single plain-text document read once at index build
//! time. A missing or empty document is an `Ingestion` error: callers
//! catch it at the build boundary and continue in generation-only mode.

use std::path::{Path, PathBuf};
use tutor_core::{AppError, AppResult};

/// The loaded corpus document. Immutable after load.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source path
    pub path: PathBuf,

    /// Full document text
    pub text: String,
}

impl Document {
    /// Document length in bytes.
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }
}

/// Load the corpus document from disk.
pub fn load_document(path: &Path) -> AppResult<Document> {
    if !path.exists() {
        return Err(AppError::Ingestion(format!(
            "Corpus document not found at {:?}",
            path
        )));
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to read corpus {:?}: {}", path, e)))?;

    if text.trim().is_empty() {
        return Err(AppError::Ingestion(format!(
            "Corpus document {:?} is empty",
            path
        )));
    }

    tracing::info!("Loaded corpus {:?} ({} bytes)", path, text.len());

    Ok(Document {
        path: path.to_path_buf(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Sing in me, Muse, and through me tell the story.").unwrap();

        let doc = load_document(file.path()).unwrap();
        assert!(doc.text.contains("Muse"));
        assert_eq!(doc.path, file.path());
    }

    #[test]
    fn test_missing_document_is_ingestion_error() {
        let err = load_document(Path::new("/nonexistent/guide.txt")).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }

    #[test]
    fn test_empty_document_is_ingestion_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "   \n\t ").unwrap();

        let err = load_document(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Ingestion(_)));
    }
}
