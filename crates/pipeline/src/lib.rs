//! Routed, self-checking question answering.
//!
//! A question goes through five agent stages in a fixed order: a router
//! picks the document index or the web, a retriever fetches snippets, a
//! grader filters them, a hallucination grader drafts and checks an answer,
//! and an answer grader finalises it, re-grounding once through the web
//! when the draft is not supported by its context.
//!
//! [`Session`] wraps a [`Pipeline`] with a conversation history and is the
//! surface hosts (CLI, web UI) talk to.

pub mod agent;
pub mod graph;
pub mod orchestrator;
pub mod session;
pub mod stages;
pub mod types;

#[cfg(test)]
mod tests;

pub use agent::Agent;
pub use graph::{StageDescriptor, StageKind, TaskGraph, ToolBinding};
pub use orchestrator::{Pipeline, PipelineBuilder};
pub use session::{
    build_pipeline, ConfigPipelineFactory, ConversationEntry, PendingQuestion, PipelineFactory,
    Session,
};
pub use types::{
    Answer, Degradation, GradedContext, HallucinationVerdict, PipelineErrorKind, PipelineOutcome,
    RouteDecision,
};
