//! The completion seam between agent roles and hosted models.
//!
//! Every role in the pipeline talks to its model through [`LlmClient`], so
//! stages never see provider wire formats and tests can swap in a scripted
//! client.

use ragcrew_core::AppResult;
use serde::{Deserialize, Serialize};

/// One single-turn completion: a system prompt plus a user message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// Rendered task prompt, sent as the user message.
    pub prompt: String,

    /// Model identifier as the provider knows it ("llama3.2", "deepseek/deepseek-r1").
    pub model: String,

    /// Role persona, sent as the system message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Which caller issued the request. Only used for log attribution.
    #[serde(skip)]
    pub label: Option<String>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            temperature: None,
            max_tokens: None,
            label: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Tag the request with the issuing role so provider logs can name it.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for log lines, falling back to the model name.
    pub fn caller(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.model)
    }
}

/// A finished completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Raw reply text, possibly including a reasoning trace.
    pub content: String,

    /// Model that actually answered (providers may resolve aliases).
    pub model: String,

    pub usage: LlmUsage,
}

/// Token accounting reported by the provider. Zero when it reports nothing.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A hosted model that answers one request at a time.
///
/// Implementations must be shareable across roles: the same client is
/// handed to every agent bound to that provider.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider id used in logs ("ollama", "groq", "scripted").
    fn provider_name(&self) -> &str;

    /// Run a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = LlmRequest::new("Route this", "llama3.2")
            .with_system("You are a router")
            .with_temperature(0.0)
            .with_max_tokens(16)
            .with_label("router");

        assert_eq!(request.prompt, "Route this");
        assert_eq!(request.system.as_deref(), Some("You are a router"));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(16));
        assert_eq!(request.caller(), "router");
    }

    #[test]
    fn test_caller_falls_back_to_model() {
        let request = LlmRequest::new("hi", "qwen2.5");
        assert_eq!(request.caller(), "qwen2.5");
    }

    #[test]
    fn test_label_is_not_serialized() {
        let request = LlmRequest::new("hi", "qwen2.5").with_label("grader");
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("label").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_usage_totals() {
        let usage = LlmUsage::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
        assert_eq!(LlmUsage::new(u32::MAX, 1).total_tokens, u32::MAX);
    }
}
