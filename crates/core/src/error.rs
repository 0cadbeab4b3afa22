//! Error types for ragcrew.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! language-model, retrieval, prompt and pipeline errors.

use thiserror::Error;

/// Unified error type for ragcrew.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language-model provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document or web retrieval errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Role and task definition errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Pipeline is missing or could not be built (bad corpus path, tool construction)
    #[error("Pipeline initialization error: {0}")]
    PipelineInitialization(String),

    /// Pipeline execution errors
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_prefixes() {
        let err = AppError::Retrieval("tavily returned 429".to_string());
        assert_eq!(err.to_string(), "Retrieval error: tavily returned 429");

        let err = AppError::PipelineInitialization("corpus missing".to_string());
        assert!(err.to_string().starts_with("Pipeline initialization error"));
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
