//! LLM integration crate for ragcrew.
//!
//! This crate provides a provider-agnostic abstraction for the hosted models
//! behind each agent role. It supports multiple providers through a unified
//! trait-based interface.
//!
//! # Providers
//! - **OpenRouter / Groq / OpenAI**: chat-completions compatible APIs
//! - **Ollama**: local LLM runtime
//! - **Scripted**: deterministic replies for tests and offline runs
//!
//! # Example
//! ```no_run
//! use ragcrew_llm::{create_client, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", None, None)?;
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_client_for};
pub use providers::{OllamaClient, OpenAiCompatClient, ScriptedClient};
pub use types::ProviderType;
