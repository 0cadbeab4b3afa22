//! Prompt builder: renders a role and a task into system and user messages.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, RoleDefinition, TaskDefinition};
use handlebars::Handlebars;
use ragcrew_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a role, a task and the task's input variables.
///
/// # Example
/// ```no_run
/// use ragcrew_prompt::{build_prompt, PromptSet};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompts = PromptSet::defaults()?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is multi-head attention?".to_string());
///
/// let built = build_prompt(prompts.role("router")?, prompts.task("route")?, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    role: &RoleDefinition,
    task: &TaskDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: role={}, task={}", role.id, task.id);

    let mut user = render_template(&task.id, &task.description, &variables)?;
    if !task.expected_output.trim().is_empty() {
        user.push_str("\n\nThis is the expected criteria for your final answer: ");
        user.push_str(task.expected_output.trim());
    }

    Ok(BuiltPrompt {
        system: render_system(role),
        user,
        metadata: BuiltPromptMetadata {
            role_id: role.id.clone(),
            task_id: task.id.clone(),
            resolved_variables: variables,
        },
    })
}

/// Render the persona as a system message.
fn render_system(role: &RoleDefinition) -> String {
    let mut system = format!("You are {}.", role.role.trim());
    if !role.backstory.trim().is_empty() {
        system.push(' ');
        system.push_str(role.backstory.trim());
    }
    system.push_str("\nYour personal goal is: ");
    system.push_str(role.goal.trim());
    system
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(
    name: &str,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template '{}': {}", name, e)))?;

    handlebars
        .render(name, variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role() -> RoleDefinition {
        RoleDefinition {
            id: "router".to_string(),
            role: "Router".to_string(),
            goal: "Pick a source".to_string(),
            backstory: "You are decisive.".to_string(),
        }
    }

    fn task(expected: &str) -> TaskDefinition {
        TaskDefinition {
            id: "route".to_string(),
            description: "Question: {{question}}".to_string(),
            expected_output: expected.to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Is <b>this</b> escaped?".to_string());

        let result = render_template("t", "Q: {{question}}", &vars).unwrap();
        assert_eq!(result, "Q: Is <b>this</b> escaped?");
    }

    #[test]
    fn test_build_prompt_appends_expected_output() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is a transformer?".to_string());

        let built = build_prompt(&role(), &task("one word"), vars).unwrap();
        assert!(built.user.starts_with("Question: What is a transformer?"));
        assert!(built.user.ends_with("expected criteria for your final answer: one word"));
        assert!(built.system.starts_with("You are Router. You are decisive."));
        assert!(built.system.contains("Your personal goal is: Pick a source"));
        assert_eq!(built.metadata.task_id, "route");
    }

    #[test]
    fn test_build_prompt_without_expected_output() {
        let built = build_prompt(&role(), &task(""), HashMap::new()).unwrap();
        assert_eq!(built.user, "Question: ");
    }

    #[test]
    fn test_unbalanced_template_is_prompt_error() {
        let result = render_template("bad", "{{#if question}}open", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
