//! Error types for the tutor CLI.
//!
//! This module defines a unified error enum covering every error category
//! in the application: configuration, ingestion, remote-call failures
//! (auth, rate limit, transient), generation, knowledge, and prompt errors.

use thiserror::Error;

/// Unified error type for the tutor CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration errors: bad chunking parameters, unknown provider,
    /// missing credential. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Corpus document missing, unreadable, or empty. Non-fatal: the
    /// pipeline degrades to generation-only mode without retrieval.
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// Bad or rejected credential on a remote call. Never retried.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Quota exceeded on a remote call (HTTP 429). Retryable.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Timeout, connection failure, or 5xx on a remote call. Retryable.
    #[error("Transient error: {0}")]
    Transient(String),

    /// Terminal generation failure (malformed request or downstream
    /// fatal error).
    #[error("Generation error: {0}")]
    Generation(String),

    /// Retry budget exhausted. Carries the user-facing capacity message
    /// so the rendering surface can show it verbatim.
    #[error("{0}")]
    Overloaded(String),

    /// Knowledge base and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt composition errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a retry loop may attempt the failed call again.
    ///
    /// Only rate-limit and transient failures qualify; auth and malformed
    /// requests are fatal on first occurrence.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::RateLimited(_) | AppError::Transient(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
