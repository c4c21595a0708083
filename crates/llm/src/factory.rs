//! LLM provider factory.
//!
//! Resolves the configured provider name to a concrete client. Credential
//! problems are reported here, at startup, instead of deep inside the
//! turn pipeline.

use crate::client::LlmClient;
use crate::providers::GeminiClient;
use std::sync::Arc;
use tutor_core::{AppError, AppResult};

/// Create an LLM client for the given provider.
///
/// # Arguments
/// * `provider` - Provider identifier (currently "gemini")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API credential, required for remote providers
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "gemini" => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Gemini provider requires an API key".to_string())
            })?;

            let client = match endpoint {
                Some(base_url) => GeminiClient::with_base_url(api_key, base_url),
                None => GeminiClient::new(api_key),
            };
            Ok(Arc::new(client))
        }
        other => Err(AppError::Config(format!("Unknown provider: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_gemini_client() {
        let client = create_client("gemini", None, Some("key")).unwrap();
        assert_eq!(client.provider_name(), "gemini");
    }

    #[test]
    fn test_create_gemini_with_custom_endpoint() {
        let client = create_client("gemini", Some("http://localhost:8080"), Some("key"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_gemini_requires_api_key() {
        match create_client("gemini", None, None) {
            Err(err) => assert!(err.to_string().contains("requires an API key")),
            Ok(_) => panic!("Expected error for Gemini without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
