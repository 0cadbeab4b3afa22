//! LLM provider factory.
//!
//! Creates LLM clients from a provider name plus the endpoint and secret
//! resolved by the application config.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, OpenAiCompatClient};
use crate::types::ProviderType;
use ragcrew_core::config::ModelBinding;
use ragcrew_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

const OLLAMA_TIMEOUT: Duration = Duration::from_secs(300);

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openrouter", "groq", "openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by every hosted provider)
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or its key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(provider_type.default_endpoint());
            let client = OllamaClient::new(base_url, OLLAMA_TIMEOUT)?;
            Ok(Arc::new(client))
        }
        hosted => {
            let api_key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
                AppError::Config(format!("{} provider requires API key", hosted.as_str()))
            })?;
            let client = OpenAiCompatClient::new(hosted, endpoint, api_key)?;
            Ok(Arc::new(client))
        }
    }
}

/// Create the client for a resolved role binding.
pub fn create_client_for(binding: &ModelBinding) -> AppResult<Arc<dyn LlmClient>> {
    create_client(
        &binding.provider,
        binding.endpoint.as_deref(),
        binding.api_key.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_openrouter_client() {
        let client = create_client("openrouter", None, Some("sk-or-test")).unwrap();
        assert_eq!(client.provider_name(), "openrouter");
    }

    #[test]
    fn test_hosted_provider_requires_api_key() {
        match create_client("groq", None, None) {
            Err(err) => assert!(err.to_string().contains("groq provider requires API key")),
            Ok(_) => panic!("Expected error for Groq without API key"),
        }
    }

    #[test]
    fn test_blank_api_key_is_rejected() {
        assert!(create_client("openai", None, Some("   ")).is_err());
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_create_client_for_binding() {
        let binding = ModelBinding {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            endpoint: Some("http://localhost:8080".to_string()),
            api_key: None,
            temperature: 0.0,
        };
        assert!(create_client_for(&binding).is_ok());
    }
}
