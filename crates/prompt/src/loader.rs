//! Loads the role and task definitions used by the pipeline.
//!
//! Built-in defaults are compiled in. A workspace can replace any of them by
//! dropping `<id>.yml` into `.ragcrew/prompts/`, with `kind: role` or
//! `kind: task` selecting which definition it replaces.

use crate::types::{PromptDocument, RoleDefinition, TaskDefinition};
use ragcrew_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::Path;

const DEFAULT_ROLES: &str = include_str!("../defaults/roles.yml");
const DEFAULT_TASKS: &str = include_str!("../defaults/tasks.yml");

/// All role and task definitions, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PromptSet {
    roles: HashMap<String, RoleDefinition>,
    tasks: HashMap<String, TaskDefinition>,
}

impl PromptSet {
    /// The compiled-in definitions.
    pub fn defaults() -> AppResult<Self> {
        let roles: Vec<RoleDefinition> = serde_yaml::from_str(DEFAULT_ROLES)
            .map_err(|e| AppError::Prompt(format!("Failed to parse default roles: {}", e)))?;
        let tasks: Vec<TaskDefinition> = serde_yaml::from_str(DEFAULT_TASKS)
            .map_err(|e| AppError::Prompt(format!("Failed to parse default tasks: {}", e)))?;

        let mut set = Self::default();
        for role in roles {
            set.insert_role(role)?;
        }
        for task in tasks {
            set.insert_task(task)?;
        }
        Ok(set)
    }

    /// Defaults with any overrides found in `prompts_dir` applied.
    ///
    /// A missing directory is not an error.
    pub fn load(prompts_dir: &Path) -> AppResult<Self> {
        let mut set = Self::defaults()?;

        if !prompts_dir.exists() {
            return Ok(set);
        }

        for entry in walkdir::WalkDir::new(prompts_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let is_yaml = matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yml") | Some("yaml")
            );
            if !path.is_file() || !is_yaml {
                continue;
            }

            match load_document(path)? {
                PromptDocument::Role(role) => {
                    tracing::info!("Overriding role '{}' from {:?}", role.id, path);
                    set.insert_role(role)?;
                }
                PromptDocument::Task(task) => {
                    tracing::info!("Overriding task '{}' from {:?}", task.id, path);
                    set.insert_task(task)?;
                }
            }
        }

        Ok(set)
    }

    /// Look up a role by id.
    pub fn role(&self, id: &str) -> AppResult<&RoleDefinition> {
        self.roles
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown role: {}", id)))
    }

    /// Look up a task by id.
    pub fn task(&self, id: &str) -> AppResult<&TaskDefinition> {
        self.tasks
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown task: {}", id)))
    }

    /// Add or replace a role after validating it.
    pub fn insert_role(&mut self, role: RoleDefinition) -> AppResult<()> {
        validate_role(&role)?;
        self.roles.insert(role.id.clone(), role);
        Ok(())
    }

    /// Add or replace a task after validating it.
    pub fn insert_task(&mut self, task: TaskDefinition) -> AppResult<()> {
        validate_task(&task)?;
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }
}

fn load_document(path: &Path) -> AppResult<PromptDocument> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e)))
}

fn validate_role(role: &RoleDefinition) -> AppResult<()> {
    if role.id.trim().is_empty() {
        return Err(AppError::Prompt("Role id cannot be empty".to_string()));
    }

    if role.role.trim().is_empty() || role.goal.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Role '{}' needs both a role title and a goal",
            role.id
        )));
    }

    Ok(())
}

fn validate_task(task: &TaskDefinition) -> AppResult<()> {
    if task.id.trim().is_empty() {
        return Err(AppError::Prompt("Task id cannot be empty".to_string()));
    }

    if task.description.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Task '{}' description cannot be empty",
            task.id
        )));
    }

    // Catch template syntax errors at load time instead of mid-pipeline
    crate::builder::render_template(&task.id, &task.description, &HashMap::new())?;

    Ok(())
}
