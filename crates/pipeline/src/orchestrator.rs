//! Pipeline orchestration.
//!
//! Runs Route → Retrieve → Grade → CheckHallucination → Answer strictly in
//! sequence. Every stage error stops the run and is turned into a
//! [`PipelineOutcome::Failed`] here, so callers always get an outcome.

use crate::agent::Agent;
use crate::graph::{StageKind, TaskGraph};
use crate::stages::answer::AnswerInput;
use crate::stages::{answer, grader, hallucination, retriever, router, BoundStage, Toolbox};
use crate::types::{Answer, Degradation, PipelineErrorKind, PipelineOutcome, StageError};
use ragcrew_core::{AppError, AppResult};
use ragcrew_llm::LlmClient;
use ragcrew_prompt::PromptSet;
use ragcrew_tools::RetrievalTool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// A fully bound pipeline. Read-only once built.
#[derive(Debug)]
pub struct Pipeline {
    graph: TaskGraph,
    stages: Vec<BoundStage>,
    tools: Toolbox,
}

impl Pipeline {
    pub fn builder(prompts: PromptSet) -> PipelineBuilder {
        PipelineBuilder::new(prompts)
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    pub fn tools(&self) -> &Toolbox {
        &self.tools
    }

    /// Answer one question. Never returns an empty answer.
    pub async fn run(&self, question: &str) -> PipelineOutcome {
        let question = question.trim();
        if question.is_empty() {
            return PipelineOutcome::failed(PipelineErrorKind::Internal, "The question is empty");
        }

        let span = tracing::info_span!("pipeline", question_len = question.len());
        let start = Instant::now();

        let outcome = match self.execute(question).instrument(span).await {
            Ok((answer, degradations)) => PipelineOutcome::Answered {
                answer,
                degradations,
            },
            Err(err) => {
                tracing::error!("Pipeline failed: {}", err);
                PipelineOutcome::Failed {
                    kind: err.kind,
                    message: err.message,
                }
            }
        };

        tracing::info!(
            "Pipeline finished in {:.2}s (error: {})",
            start.elapsed().as_secs_f64(),
            outcome.is_error()
        );
        outcome
    }

    async fn execute(&self, question: &str) -> Result<(Answer, Vec<Degradation>), StageError> {
        let mut degradations = Vec::new();

        let (route, degraded) = router::route(self.stage(StageKind::Route)?, question)
            .instrument(stage_span(StageKind::Route))
            .await?;
        degradations.extend(degraded);
        tracing::info!("Routed to {}", route);

        let snippets = retriever::retrieve(
            self.stage(StageKind::Retrieve)?,
            &self.tools,
            question,
            route,
        )
        .instrument(stage_span(StageKind::Retrieve))
        .await?;
        tracing::info!("Retrieved {} snippets", snippets.len());

        let (context, degraded) = grader::grade(self.stage(StageKind::Grade)?, question, snippets)
            .instrument(stage_span(StageKind::Grade))
            .await?;
        degradations.extend(degraded);

        let checker = self.stage(StageKind::CheckHallucination)?;
        let check = hallucination::check(checker, question, &context)
            .instrument(stage_span(StageKind::CheckHallucination))
            .await?;

        let answer = answer::answer(
            self.stage(StageKind::Answer)?,
            checker,
            self.tools.web.as_ref(),
            AnswerInput {
                question,
                route,
                context,
                check,
            },
        )
        .instrument(stage_span(StageKind::Answer))
        .await?;

        Ok((answer, degradations))
    }

    fn stage(&self, kind: StageKind) -> Result<&BoundStage, StageError> {
        self.stages.iter().find(|s| s.kind == kind).ok_or_else(|| {
            StageError::new(
                PipelineErrorKind::Internal,
                format!("Stage '{}' is not bound", kind),
            )
        })
    }
}

fn stage_span(kind: StageKind) -> tracing::Span {
    tracing::info_span!("stage", name = kind.as_str())
}

#[derive(Clone)]
struct ModelSlot {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
}

/// Binds roles to models and stages to tools.
pub struct PipelineBuilder {
    prompts: PromptSet,
    graph: TaskGraph,
    default_model: Option<ModelSlot>,
    role_models: HashMap<String, ModelSlot>,
    document: Option<Arc<dyn RetrievalTool>>,
    web: Option<Arc<dyn RetrievalTool>>,
}

impl PipelineBuilder {
    pub fn new(prompts: PromptSet) -> Self {
        Self {
            prompts,
            graph: TaskGraph::standard(),
            default_model: None,
            role_models: HashMap::new(),
            document: None,
            web: None,
        }
    }

    pub fn graph(mut self, graph: TaskGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Model used by every role without its own binding.
    pub fn model(mut self, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        self.default_model = Some(ModelSlot {
            client,
            model: model.into(),
            temperature: 0.0,
        });
        self
    }

    pub fn role_model(
        mut self,
        role_id: impl Into<String>,
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        self.role_models.insert(
            role_id.into(),
            ModelSlot {
                client,
                model: model.into(),
                temperature,
            },
        );
        self
    }

    pub fn document_tool(mut self, tool: Arc<dyn RetrievalTool>) -> Self {
        self.document = Some(tool);
        self
    }

    pub fn web_tool(mut self, tool: Arc<dyn RetrievalTool>) -> Self {
        self.web = Some(tool);
        self
    }

    pub fn build(self) -> AppResult<Pipeline> {
        let document = self.document.ok_or_else(|| {
            AppError::PipelineInitialization("No document tool was bound".to_string())
        })?;
        let web = self
            .web
            .ok_or_else(|| AppError::PipelineInitialization("No web tool was bound".to_string()))?;

        let mut stages = Vec::with_capacity(self.graph.stages().len());
        for descriptor in self.graph.stages() {
            let slot = self
                .role_models
                .get(&descriptor.role_id)
                .or(self.default_model.as_ref())
                .ok_or_else(|| {
                    AppError::PipelineInitialization(format!(
                        "No model bound for role '{}'",
                        descriptor.role_id
                    ))
                })?;

            let role = self
                .prompts
                .role(&descriptor.role_id)
                .map_err(|e| AppError::PipelineInitialization(e.to_string()))?;
            let task = self
                .prompts
                .task(&descriptor.task_id)
                .map_err(|e| AppError::PipelineInitialization(e.to_string()))?;

            stages.push(BoundStage {
                kind: descriptor.kind,
                agent: Agent::new(
                    role.clone(),
                    slot.client.clone(),
                    slot.model.clone(),
                    slot.temperature,
                ),
                task: task.clone(),
            });
        }

        tracing::debug!(
            "Pipeline bound: document tool {}, web tool {}",
            document.name(),
            web.name()
        );

        Ok(Pipeline {
            graph: self.graph,
            stages,
            tools: Toolbox { document, web },
        })
    }
}
