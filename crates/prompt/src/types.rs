//! Role and task definition types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An agent persona: rendered as the system prompt for every call the role makes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDefinition {
    /// Unique role identifier (e.g., "router")
    pub id: String,

    /// Short role title shown to the model
    pub role: String,

    /// What the role is trying to achieve
    pub goal: String,

    /// Persona background
    #[serde(default)]
    pub backstory: String,
}

/// A unit of work handed to a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Unique task identifier (e.g., "route")
    pub id: String,

    /// Handlebars template for the task instructions
    pub description: String,

    /// Description of the expected reply format
    #[serde(default)]
    pub expected_output: String,
}

/// Override file contents under `.ragcrew/prompts/<id>.yml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PromptDocument {
    Role(RoleDefinition),
    Task(TaskDefinition),
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message rendered from the role
    pub system: String,

    /// User message rendered from the task
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    #[serde(rename = "roleId")]
    pub role_id: String,

    #[serde(rename = "taskId")]
    pub task_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}
