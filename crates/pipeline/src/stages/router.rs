//! Route the question to the document index or the web.

use super::BoundStage;
use crate::types::{Degradation, PipelineErrorKind, RouteDecision, StageError};

const VECTORSTORE_WORDS: &[&str] = &["vectorstore", "vector store", "vector_store"];
const WEB_WORDS: &[&str] = &["web_search", "web search", "websearch"];

/// Ask the router agent for a decision.
///
/// An unusable reply is not fatal: the run continues with web search and
/// records a `RoutingError` degradation.
pub async fn route(
    stage: &BoundStage,
    question: &str,
) -> Result<(RouteDecision, Option<Degradation>), StageError> {
    let reply = stage.perform(&[("question", question)]).await?;

    match parse_route(&reply) {
        Some(decision) => Ok((decision, None)),
        None => {
            tracing::warn!("Router reply {:?} is not a single route, using web search", reply);
            Ok((
                RouteDecision::WebSearch,
                Some(Degradation::new(
                    PipelineErrorKind::RoutingError,
                    format!("Unrecognised route decision: {:?}", reply),
                )),
            ))
        }
    }
}

/// Exactly one of the two route names must appear in the reply.
pub fn parse_route(reply: &str) -> Option<RouteDecision> {
    let lower = reply.to_lowercase();
    let vectorstore = VECTORSTORE_WORDS.iter().any(|w| lower.contains(w));
    let web = WEB_WORDS.iter().any(|w| lower.contains(w));

    match (vectorstore, web) {
        (true, false) => Some(RouteDecision::VectorStore),
        (false, true) => Some(RouteDecision::WebSearch),
        _ => None,
    }
}
