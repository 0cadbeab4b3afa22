//! Draft an answer from the graded context and judge whether it is grounded.

use super::{context_block, BoundStage};
use crate::types::{GradedContext, HallucinationVerdict, StageError};

#[derive(Debug, Clone, PartialEq)]
pub struct HallucinationCheck {
    pub draft: String,
    pub verdict: HallucinationVerdict,
}

pub async fn check(
    stage: &BoundStage,
    question: &str,
    context: &GradedContext,
) -> Result<HallucinationCheck, StageError> {
    let facts = context_block(&context.snippets);
    let reply = stage
        .perform(&[("question", question), ("context", &facts)])
        .await?;

    let result = parse_check(&reply);
    tracing::info!("Hallucination verdict: {:?}", result.verdict);
    Ok(result)
}

/// Split an `ANSWER:` / `GROUNDED:` reply.
///
/// A missing or unreadable `GROUNDED:` line counts as ungrounded.
pub fn parse_check(reply: &str) -> HallucinationCheck {
    let mut verdict = HallucinationVerdict::Ungrounded;
    let mut answer_lines = Vec::new();

    for line in reply.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        if let Some(value) = lower.strip_prefix("grounded:") {
            let value = value.trim().trim_end_matches('.');
            verdict = match value {
                "yes" | "true" | "grounded" => HallucinationVerdict::Grounded,
                _ => HallucinationVerdict::Ungrounded,
            };
            continue;
        }

        if lower.starts_with("answer:") {
            answer_lines.clear();
            let rest = trimmed.get("answer:".len()..).unwrap_or("").trim();
            if !rest.is_empty() {
                answer_lines.push(rest.to_string());
            }
            continue;
        }

        answer_lines.push(line.to_string());
    }

    HallucinationCheck {
        draft: answer_lines.join("\n").trim().to_string(),
        verdict,
    }
}
