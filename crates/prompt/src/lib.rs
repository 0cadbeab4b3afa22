//! Role and task definitions for ragcrew agents.
//!
//! This crate provides:
//! - YAML role (persona) and task definitions, with compiled-in defaults
//! - Workspace overrides from `.ragcrew/prompts/`
//! - Handlebars rendering of a role + task into system/user messages

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::PromptSet;
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDocument, RoleDefinition, TaskDefinition};
