//! Remote Gemini embedding provider.
//!
//! Wraps the `batchEmbedContents` endpoint. Shares the status-to-error
//! mapping with the generation client so auth, quota, and transient
//! failures stay distinguishable for retry decisions.

use crate::embeddings::EmbeddingProvider;
use serde::{Deserialize, Serialize};
use tutor_core::{AppError, AppResult};
use tutor_llm::providers::gemini::{classify_http_status, classify_transport_error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Dimensionality of the embedding-001 model.
const GEMINI_EMBEDDING_DIMENSIONS: usize = 768;

/// Request timeout for a single embedding batch.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest {
    model: String,
    content: EmbedContent,
}

#[derive(Debug, Serialize)]
struct EmbedContent {
    parts: Vec<EmbedPart>,
}

#[derive(Debug, Serialize)]
struct EmbedPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Gemini embedding client.
#[derive(Debug)]
pub struct GeminiEmbedder {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder with the default endpoint.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create a new Gemini embedder with a custom base URL.
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        GEMINI_EMBEDDING_DIMENSIONS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("Embedding {} texts via Gemini ({})", texts.len(), self.model);

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: format!("models/{}", self.model),
                    content: EmbedContent {
                        parts: vec![EmbedPart { text: text.clone() }],
                    },
                })
                .collect(),
        };

        let url = format!(
            "{}/v1beta/models/{}:batchEmbedContents",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_http_status(status, &body));
        }

        let parsed: BatchEmbedResponse = response.json().await.map_err(|e| {
            AppError::Knowledge(format!("Failed to parse embedding response: {}", e))
        })?;

        if parsed.embeddings.len() != texts.len() {
            return Err(AppError::Knowledge(format!(
                "Embedding count mismatch: sent {} texts, received {} vectors",
                texts.len(),
                parsed.embeddings.len()
            )));
        }

        Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
    }
}
