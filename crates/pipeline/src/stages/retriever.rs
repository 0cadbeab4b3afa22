//! Fetch snippets from the tool the router selected.

use super::{BoundStage, Toolbox};
use crate::types::{PipelineErrorKind, RouteDecision, StageError};
use ragcrew_tools::Snippet;

/// Rewrite the question into a search query, then query only the selected
/// tool. There is no fallback to the other tool on failure.
pub async fn retrieve(
    stage: &BoundStage,
    tools: &Toolbox,
    question: &str,
    decision: RouteDecision,
) -> Result<Vec<Snippet>, StageError> {
    let reply = stage
        .perform(&[("question", question), ("route", decision.as_str())])
        .await?;
    let query = search_query(&reply, question);

    let tool = match decision {
        RouteDecision::VectorStore => &tools.document,
        RouteDecision::WebSearch => &tools.web,
    };

    tracing::info!("Querying {} with {:?}", tool.name(), query);

    tool.search(&query).await.map_err(|e| {
        StageError::new(
            PipelineErrorKind::RetrievalFailure,
            format!("{} failed: {}", tool.name(), e),
        )
    })
}

/// First non-empty line of the reply, unquoted; the question when blank.
pub fn search_query(reply: &str, question: &str) -> String {
    let query = reply
        .lines()
        .map(|line| line.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`').trim())
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if query.is_empty() {
        question.to_string()
    } else {
        query.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query() {
        assert_eq!(search_query("\"transformer attention\"\n", "q"), "transformer attention");
        assert_eq!(search_query("\n\n  bleu score  \nextra", "q"), "bleu score");
        assert_eq!(search_query("   ", "What is BLEU?"), "What is BLEU?");
        assert_eq!(search_query("\"\"", "What is BLEU?"), "What is BLEU?");
    }
}
