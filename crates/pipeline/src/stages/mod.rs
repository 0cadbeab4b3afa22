//! The five pipeline stages.
//!
//! Each stage is an async function over typed inputs. Stages never decide
//! what happens after them; the orchestrator owns control flow.

pub mod answer;
pub mod grader;
pub mod hallucination;
pub mod retriever;
pub mod router;

use crate::agent::Agent;
use crate::graph::StageKind;
use crate::types::StageError;
use ragcrew_prompt::TaskDefinition;
use ragcrew_tools::{RetrievalTool, Snippet};
use std::collections::HashMap;
use std::sync::Arc;

/// A stage's agent together with the task it performs.
#[derive(Debug, Clone)]
pub struct BoundStage {
    pub kind: StageKind,
    pub agent: Agent,
    pub task: TaskDefinition,
}

impl BoundStage {
    pub(crate) async fn perform(&self, variables: &[(&str, &str)]) -> Result<String, StageError> {
        let variables: HashMap<String, String> = variables
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        self.agent
            .perform(&self.task, variables)
            .await
            .map_err(StageError::from_agent)
    }
}

/// The two retrieval tools a pipeline is bound to.
#[derive(Clone)]
pub struct Toolbox {
    pub document: Arc<dyn RetrievalTool>,
    pub web: Arc<dyn RetrievalTool>,
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("document", &self.document.name())
            .field("web", &self.web.name())
            .finish()
    }
}

/// Render snippets as a numbered list, starting at 1.
pub(crate) fn numbered(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[{}] {}\n(source: {})", i + 1, s.text.trim(), s.provenance))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Context block for drafting prompts.
pub(crate) fn context_block(snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        "No relevant context was found.".to_string()
    } else {
        numbered(snippets)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_snippets() {
        let snippets = vec![
            Snippet::document("first", "paper.pdf", 0),
            Snippet::web("second", "https://x.example", "X"),
        ];
        let text = numbered(&snippets);
        assert!(text.starts_with("[1] first\n(source: paper.pdf (chunk 0))"));
        assert!(text.contains("[2] second"));
    }

    #[test]
    fn test_empty_context_block() {
        assert_eq!(context_block(&[]), "No relevant context was found.");
    }
}
