//! Pipeline data model.

use ragcrew_tools::{Provenance, Snippet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentence used when no stage produced any answer text.
pub const FALLBACK_ANSWER: &str =
    "I could not produce an answer to this question from the available sources.";

/// Appended to answers that went through the web re-grounding pass.
pub const REMEDIATION_NOTE: &str = "Note: the first draft was not supported by the retrieved \
context, so this answer was re-grounded with a web search.";

/// Source chosen by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteDecision {
    #[serde(rename = "vectorstore")]
    VectorStore,
    #[serde(rename = "web_search")]
    WebSearch,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VectorStore => "vectorstore",
            Self::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snippets the grader kept, in retrieval order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradedContext {
    pub snippets: Vec<Snippet>,
}

impl GradedContext {
    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }

    pub fn sources(&self) -> Vec<Provenance> {
        self.snippets.iter().map(|s| s.provenance.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HallucinationVerdict {
    Grounded,
    Ungrounded,
}

/// Final answer of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Never empty
    pub text: String,
    pub route: RouteDecision,
    pub verdict: HallucinationVerdict,
    /// Whether the web re-grounding pass ran
    pub remediated: bool,
    pub sources: Vec<Provenance>,
}

/// Failure taxonomy for a run.
///
/// `RoutingError` and `GradingDegraded` are recovered in place and only show
/// up as degradations; the rest end the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineErrorKind {
    RoutingError,
    RetrievalFailure,
    GradingDegraded,
    HallucinationRemediation,
    PipelineInitialization,
    Model,
    Internal,
}

impl fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::RoutingError => "routing error",
            Self::RetrievalFailure => "retrieval failure",
            Self::GradingDegraded => "grading degraded",
            Self::HallucinationRemediation => "hallucination remediation failed",
            Self::PipelineInitialization => "pipeline initialization error",
            Self::Model => "model error",
            Self::Internal => "internal error",
        };
        f.write_str(s)
    }
}

/// A recovered problem recorded alongside a successful answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    pub kind: PipelineErrorKind,
    pub message: String,
}

impl Degradation {
    pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Error that ends a run at a stage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: PipelineErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify an error from an agent call.
    pub fn from_agent(err: ragcrew_core::AppError) -> Self {
        match err {
            ragcrew_core::AppError::Llm(message) => Self::new(PipelineErrorKind::Model, message),
            other => Self::new(PipelineErrorKind::Internal, other.to_string()),
        }
    }
}

/// Tagged result of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    Answered {
        answer: Answer,
        degradations: Vec<Degradation>,
    },
    Failed {
        kind: PipelineErrorKind,
        message: String,
    },
}

impl PipelineOutcome {
    pub fn failed(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    /// User-facing text; never empty.
    pub fn answer_text(&self) -> String {
        match self {
            Self::Answered { answer, .. } if !answer.text.trim().is_empty() => answer.text.clone(),
            Self::Answered { .. } => FALLBACK_ANSWER.to_string(),
            Self::Failed { kind, message } if message.trim().is_empty() => {
                format!("Sorry, the question could not be answered ({}).", kind)
            }
            Self::Failed { kind, message } => {
                format!(
                    "Sorry, the question could not be answered ({}): {}",
                    kind, message
                )
            }
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn error_kind(&self) -> Option<PipelineErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            Self::Answered { .. } => None,
        }
    }

    pub fn route(&self) -> Option<RouteDecision> {
        match self {
            Self::Answered { answer, .. } => Some(answer.route),
            Self::Failed { .. } => None,
        }
    }

    pub fn degradations(&self) -> &[Degradation] {
        match self {
            Self::Answered { degradations, .. } => degradations,
            Self::Failed { .. } => &[],
        }
    }
}
