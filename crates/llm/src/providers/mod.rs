//! Concrete LLM providers.

pub mod ollama;
pub mod openai_compat;
pub mod scripted;

pub use ollama::OllamaClient;
pub use openai_compat::OpenAiCompatClient;
pub use scripted::ScriptedClient;
