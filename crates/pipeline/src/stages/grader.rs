//! Keep only the snippets relevant to the question.

use super::{numbered, BoundStage};
use crate::types::{Degradation, GradedContext, PipelineErrorKind, StageError};
use ragcrew_tools::Snippet;

/// Filter `snippets` with the grader agent.
///
/// The result is always a subsequence of the input. An empty input skips
/// the model call; an empty result is recorded as `GradingDegraded`.
pub async fn grade(
    stage: &BoundStage,
    question: &str,
    snippets: Vec<Snippet>,
) -> Result<(GradedContext, Option<Degradation>), StageError> {
    if snippets.is_empty() {
        tracing::warn!("Nothing retrieved, skipping grading");
        return Ok((
            GradedContext::default(),
            Some(Degradation::new(
                PipelineErrorKind::GradingDegraded,
                "No snippets were retrieved",
            )),
        ));
    }

    let listing = numbered(&snippets);
    let reply = stage
        .perform(&[("question", question), ("snippets", &listing)])
        .await?;

    let keep = relevant_positions(&reply, snippets.len());
    tracing::info!(
        "Grader kept {} of {} snippets",
        keep.iter().filter(|k| **k).count(),
        snippets.len()
    );

    let graded = GradedContext {
        snippets: snippets
            .into_iter()
            .zip(keep)
            .filter_map(|(snippet, keep)| keep.then_some(snippet))
            .collect(),
    };

    if graded.is_empty() {
        tracing::warn!("Grader judged every snippet irrelevant");
        return Ok((
            graded,
            Some(Degradation::new(
                PipelineErrorKind::GradingDegraded,
                "No retrieved snippet was judged relevant",
            )),
        ));
    }

    Ok((graded, None))
}

/// Parse the 1-based snippet numbers in a grader reply into a keep mask.
///
/// Reads the text after the last `RELEVANT:` marker, or the whole reply
/// when there is none. Numbers out of range are ignored.
pub fn relevant_positions(reply: &str, count: usize) -> Vec<bool> {
    let mut keep = vec![false; count];

    let lower = reply.to_lowercase();
    let listed = match lower.rfind("relevant:") {
        Some(pos) => lower[pos + "relevant:".len()..].lines().next().unwrap_or(""),
        None => lower.as_str(),
    };

    for token in listed.split(|c: char| !c.is_ascii_digit()) {
        if let Ok(n) = token.parse::<usize>() {
            if (1..=count).contains(&n) {
                keep[n - 1] = true;
            }
        }
    }

    keep
}
