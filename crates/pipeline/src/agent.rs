//! Role-bound agents.

use ragcrew_core::AppResult;
use ragcrew_llm::{LlmClient, LlmRequest};
use ragcrew_prompt::{build_prompt, RoleDefinition, TaskDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// A persona bound to a model.
#[derive(Clone)]
pub struct Agent {
    role: RoleDefinition,
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("role", &self.role.id)
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .finish()
    }
}

impl Agent {
    pub fn new(
        role: RoleDefinition,
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            role,
            client,
            model: model.into(),
            temperature,
        }
    }

    pub fn role(&self) -> &RoleDefinition {
        &self.role
    }

    /// Render `task` with `variables` and run one completion.
    ///
    /// Returns the reply trimmed, with reasoning traces removed.
    pub async fn perform(
        &self,
        task: &TaskDefinition,
        variables: HashMap<String, String>,
    ) -> AppResult<String> {
        let built = build_prompt(&self.role, task, variables)?;

        let request = LlmRequest::new(built.user, &self.model)
            .with_system(built.system)
            .with_temperature(self.temperature)
            .with_label(&self.role.id);

        tracing::debug!(
            "{} performing task {} with {}/{}",
            self.role.id,
            task.id,
            self.client.provider_name(),
            self.model
        );

        let response = self.client.complete(&request).await?;
        let reply = strip_reasoning(&response.content);

        tracing::debug!("{} replied: {}", self.role.id, reply);
        Ok(reply)
    }
}

/// Drop `<think>…</think>` blocks that reasoning models prepend to replies.
pub fn strip_reasoning(text: &str) -> String {
    const OPEN: &str = "<think>";
    const CLOSE: &str = "</think>";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        rest = match after.find(CLOSE) {
            Some(end) => &after[end + CLOSE.len()..],
            // Unterminated trace: nothing after it is answer text.
            None => "",
        };
    }
    out.push_str(rest);

    // Some providers strip the opening tag but keep the closing one.
    let out = match out.rfind(CLOSE) {
        Some(pos) => out[pos + CLOSE.len()..].to_string(),
        None => out,
    };

    out.trim().to_string()
}
