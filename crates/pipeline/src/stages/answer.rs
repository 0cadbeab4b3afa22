//! Produce the final answer, re-grounding once through the web if needed.

use super::hallucination::{self, HallucinationCheck};
use super::{context_block, BoundStage};
use crate::types::{
    Answer, GradedContext, HallucinationVerdict, PipelineErrorKind, RouteDecision, StageError,
    FALLBACK_ANSWER, REMEDIATION_NOTE,
};
use ragcrew_tools::RetrievalTool;

/// Inputs carried into the answer stage.
#[derive(Debug, Clone)]
pub struct AnswerInput<'a> {
    pub question: &'a str,
    pub route: RouteDecision,
    pub context: GradedContext,
    pub check: HallucinationCheck,
}

/// Finalise the draft.
///
/// An ungrounded draft gets exactly one remediation pass: search the web
/// with the question, re-draft, re-check once and finalise whatever that
/// produced. A second ungrounded verdict is reported, not retried.
pub async fn answer(
    stage: &BoundStage,
    checker: &BoundStage,
    web: &dyn RetrievalTool,
    input: AnswerInput<'_>,
) -> Result<Answer, StageError> {
    let AnswerInput {
        question,
        route,
        context,
        check,
    } = input;

    if check.verdict == HallucinationVerdict::Grounded {
        let text = finalize(stage, question, &check.draft, &context).await?;
        return Ok(Answer {
            text,
            route,
            verdict: HallucinationVerdict::Grounded,
            remediated: false,
            sources: context.sources(),
        });
    }

    tracing::warn!("Draft is not grounded in the context, re-grounding with {}", web.name());

    let snippets = web.search(question).await.map_err(|e| {
        StageError::new(
            PipelineErrorKind::HallucinationRemediation,
            format!("Re-grounding search failed: {}", e),
        )
    })?;
    let web_context = GradedContext { snippets };

    let recheck = hallucination::check(checker, question, &web_context)
        .await
        .map_err(remediation_failed)?;
    if recheck.verdict == HallucinationVerdict::Ungrounded {
        tracing::warn!("Re-grounded draft is still not grounded, returning it as is");
    }

    let draft = if recheck.draft.is_empty() {
        &check.draft
    } else {
        &recheck.draft
    };
    let text = finalize(stage, question, draft, &web_context)
        .await
        .map_err(remediation_failed)?;

    Ok(Answer {
        text: format!("{}\n\n{}", text, REMEDIATION_NOTE),
        route,
        verdict: recheck.verdict,
        remediated: true,
        sources: web_context.sources(),
    })
}

/// Any failure after the draft was judged ungrounded belongs to remediation.
fn remediation_failed(err: StageError) -> StageError {
    StageError::new(
        PipelineErrorKind::HallucinationRemediation,
        format!("Re-grounding failed: {}", err.message),
    )
}

/// Run the answer agent; fall back to the draft, then to a fixed sentence.
async fn finalize(
    stage: &BoundStage,
    question: &str,
    draft: &str,
    context: &GradedContext,
) -> Result<String, StageError> {
    let facts = context_block(&context.snippets);
    let reply = stage
        .perform(&[("question", question), ("draft", draft), ("context", &facts)])
        .await?;

    if !reply.is_empty() {
        return Ok(reply);
    }

    tracing::warn!("Answer agent returned nothing, using the draft");
    if draft.trim().is_empty() {
        Ok(FALLBACK_ANSWER.to_string())
    } else {
        Ok(draft.trim().to_string())
    }
}
