//! Gemini LLM provider implementation.
//!
//! Wraps the `generateContent` endpoint of the Google Generative Language
//! API. Failures are mapped onto the `AppError` taxonomy so the resilient
//! generator can decide what to retry.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use serde::{Deserialize, Serialize};
use tutor_core::{AppError, AppResult};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Request timeout for a single generation attempt.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Gemini API request format.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response format.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize, Default)]
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,
}

/// Map an HTTP response status to the application error taxonomy.
///
/// 401/403 are credential failures (never retried), 429 is a quota
/// failure, and 5xx is a transient server failure (both retryable).
/// Everything else is a malformed request and fatal.
pub fn classify_http_status(status: reqwest::StatusCode, body: &str) -> AppError {
    match status.as_u16() {
        401 | 403 => AppError::Auth(format!("API key rejected ({}): {}", status, body)),
        429 => AppError::RateLimited(format!("Quota exceeded: {}", body)),
        s if s >= 500 => AppError::Transient(format!("Server error ({}): {}", status, body)),
        _ => AppError::Generation(format!("API error ({}): {}", status, body)),
    }
}

/// Map a reqwest transport error to the application error taxonomy.
///
/// Timeouts and connection failures are transient; anything else at the
/// transport layer is also safe to classify that way since no request
/// was accepted.
pub fn classify_transport_error(err: &reqwest::Error) -> AppError {
    AppError::Transient(format!("Request failed: {}", err))
}

/// Gemini LLM client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a new Gemini client with the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a new Gemini client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Convert LlmRequest to Gemini wire format.
    fn to_gemini_request(&self, request: &LlmRequest) -> GeminiRequest {
        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GeminiRequest {
            system_instruction: request.system.as_ref().map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: text.clone() }],
            }),
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config,
        }
    }

    /// Convert a Gemini response to LlmResponse.
    fn convert_response(&self, model: &str, response: GeminiResponse) -> AppResult<LlmResponse> {
        let content = response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| {
                AppError::Generation("Gemini returned no candidates".to_string())
            })?;

        let usage = response
            .usage_metadata
            .map(|u| LlmUsage::new(u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            model: model.to_string(),
            usage,
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!("Sending completion request to Gemini ({})", request.model);

        let gemini_request = self.to_gemini_request(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
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

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse Gemini response: {}", e)))?;

        tracing::debug!("Received completion from Gemini");

        self.convert_response(&request.model, gemini_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let auth = classify_http_status(reqwest::StatusCode::FORBIDDEN, "denied");
        assert!(matches!(auth, AppError::Auth(_)));

        let quota = classify_http_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "quota");
        assert!(quota.is_retryable());

        let server = classify_http_status(reqwest::StatusCode::SERVICE_UNAVAILABLE, "down");
        assert!(server.is_retryable());

        let bad = classify_http_status(reqwest::StatusCode::BAD_REQUEST, "malformed");
        assert!(matches!(bad, AppError::Generation(_)));
        assert!(!bad.is_retryable());
    }

    #[test]
    fn test_gemini_request_conversion() {
        let client = GeminiClient::new("key");
        let request = LlmRequest::new("Who wove the shroud?", "gemini-2.5-flash")
            .with_system("You are a tutor")
            .with_temperature(0.4)
            .with_max_tokens(256);

        let wire = client.to_gemini_request(&request);
        assert!(wire.system_instruction.is_some());
        assert_eq!(wire.contents.len(), 1);
        assert_eq!(wire.contents[0].role.as_deref(), Some("user"));
        assert_eq!(wire.contents[0].parts[0].text, "Who wove the shroud?");

        let config = wire.generation_config.expect("generation config");
        assert_eq!(config.temperature, Some(0.4));
        assert_eq!(config.max_output_tokens, Some(256));
    }

    #[test]
    fn test_convert_response_joins_parts() {
        let client = GeminiClient::new("key");
        let response = GeminiResponse {
            candidates: vec![GeminiCandidate {
                content: GeminiContent {
                    role: Some("model".to_string()),
                    parts: vec![
                        GeminiPart {
                            text: "Penelope ".to_string(),
                        },
                        GeminiPart {
                            text: "wove it.".to_string(),
                        },
                    ],
                },
            }],
            usage_metadata: Some(GeminiUsageMetadata {
                prompt_token_count: 10,
                candidates_token_count: 5,
            }),
        };

        let converted = client
            .convert_response("gemini-2.5-flash", response)
            .unwrap();
        assert_eq!(converted.content, "Penelope wove it.");
        assert_eq!(converted.usage.total_tokens, 15);
    }

    #[test]
    fn test_convert_response_without_candidates() {
        let client = GeminiClient::new("key");
        let response = GeminiResponse {
            candidates: vec![],
            usage_metadata: None,
        };

        let err = client
            .convert_response("gemini-2.5-flash", response)
            .unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
