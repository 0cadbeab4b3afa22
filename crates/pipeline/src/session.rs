//! Session driver: owns the pipeline and the conversation history.

use crate::orchestrator::Pipeline;
use crate::types::{
    Degradation, HallucinationVerdict, PipelineErrorKind, PipelineOutcome, RouteDecision,
};
use chrono::{DateTime, Utc};
use ragcrew_core::{AppConfig, AppError, AppResult};
use ragcrew_llm::create_client_for;
use ragcrew_prompt::PromptSet;
use ragcrew_tools::{DocumentTool, Provenance, WebSearchTool};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// One answered (or failed) question. Never changed once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub query: String,
    pub answer: String,
    /// Wall-clock seconds spent in the pipeline
    pub processing_time: f64,
    pub timestamp: DateTime<Utc>,
    pub error_flag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<PipelineErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDecision>,
    /// Verdict on the final answer; absent when the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<HallucinationVerdict>,
    #[serde(default)]
    pub remediated: bool,
    #[serde(default)]
    pub sources: Vec<Provenance>,
    /// Problems the run recovered from, e.g. an unreadable routing reply.
    #[serde(default)]
    pub degradations: Vec<Degradation>,
}

impl ConversationEntry {
    fn from_outcome(
        query: &str,
        outcome: &PipelineOutcome,
        processing_time: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (verdict, remediated, sources) = match outcome {
            PipelineOutcome::Answered { answer, .. } => (
                Some(answer.verdict),
                answer.remediated,
                answer.sources.clone(),
            ),
            PipelineOutcome::Failed { .. } => (None, false, Vec::new()),
        };

        Self {
            query: query.to_string(),
            answer: outcome.answer_text(),
            processing_time,
            timestamp,
            error_flag: outcome.is_error(),
            error_kind: outcome.error_kind(),
            route: outcome.route(),
            verdict,
            remediated,
            sources,
            degradations: outcome.degradations().to_vec(),
        }
    }
}

/// Builds a pipeline bound to a corpus.
#[async_trait::async_trait]
pub trait PipelineFactory: Send + Sync {
    async fn build(&self, corpus_path: &Path) -> AppResult<Pipeline>;
}

/// Production factory: models, prompts and tools come from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ConfigPipelineFactory {
    config: AppConfig,
}

impl ConfigPipelineFactory {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl PipelineFactory for ConfigPipelineFactory {
    async fn build(&self, corpus_path: &Path) -> AppResult<Pipeline> {
        let corpus_path = self.config.resolve_corpus_path(corpus_path);
        let document = DocumentTool::open(&corpus_path, &self.config.retrieval).await?;

        let search_key = self.config.search_api_key()?;
        let web = WebSearchTool::from_config(&self.config.search, search_key)?;

        let prompts = PromptSet::load(&self.config.prompts_dir())?;
        let graph = crate::graph::TaskGraph::standard();

        let mut builder = Pipeline::builder(prompts)
            .graph(graph.clone())
            .document_tool(Arc::new(document))
            .web_tool(Arc::new(web));

        for stage in graph.stages() {
            let binding = self.config.model_binding(&stage.role_id);
            tracing::debug!(
                "Role {} uses {}/{}",
                stage.role_id,
                binding.provider,
                binding.model
            );
            let client = create_client_for(&binding)?;
            builder = builder.role_model(
                stage.role_id.clone(),
                client,
                binding.model,
                binding.temperature,
            );
        }

        builder.build()
    }
}

/// Build a pipeline for `corpus_path`, reporting every failure as an
/// initialization error.
pub async fn build_pipeline(
    factory: &dyn PipelineFactory,
    corpus_path: &Path,
) -> AppResult<Pipeline> {
    tracing::info!("Initializing pipeline for corpus {:?}", corpus_path);

    factory.build(corpus_path).await.map_err(|e| match e {
        AppError::PipelineInitialization(_) => e,
        other => AppError::PipelineInitialization(other.to_string()),
    })
}

/// A validated question bound to the pipeline that will answer it.
pub struct PendingQuestion {
    question: String,
    pipeline: Arc<Pipeline>,
}

impl PendingQuestion {
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Run the pipeline. A panic inside a stage becomes an internal failure.
    pub async fn run(self) -> ConversationEntry {
        let timestamp = Utc::now();
        let start = Instant::now();

        let Self { question, pipeline } = self;
        let owned = question.clone();
        let outcome = tokio::spawn(async move { pipeline.run(&owned).await })
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Pipeline task aborted: {}", e);
                PipelineOutcome::failed(PipelineErrorKind::Internal, e.to_string())
            });

        ConversationEntry::from_outcome(
            &question,
            &outcome,
            start.elapsed().as_secs_f64(),
            timestamp,
        )
    }
}

/// Holds at most one pipeline and the history of its answers.
pub struct Session {
    factory: Arc<dyn PipelineFactory>,
    pipeline: Option<Arc<Pipeline>>,
    corpus_path: Option<PathBuf>,
    history: Vec<ConversationEntry>,
}

impl Session {
    pub fn new(factory: Arc<dyn PipelineFactory>) -> Self {
        Self {
            factory,
            pipeline: None,
            corpus_path: None,
            history: Vec::new(),
        }
    }

    /// Bind a new pipeline to `corpus_path`.
    ///
    /// On failure the previous pipeline, if any, stays in place.
    pub async fn initialize(&mut self, corpus_path: &Path) -> AppResult<()> {
        let pipeline = build_pipeline(self.factory.as_ref(), corpus_path).await?;
        self.install(pipeline, corpus_path);
        Ok(())
    }

    /// Run one question and append its entry to the history.
    pub async fn submit(&mut self, question: &str) -> AppResult<ConversationEntry> {
        let pending = self.begin(question)?;
        let entry = pending.run().await;
        self.record(entry.clone());
        Ok(entry)
    }

    pub fn factory(&self) -> Arc<dyn PipelineFactory> {
        self.factory.clone()
    }

    /// Swap in a pipeline built by [`build_pipeline`].
    pub fn install(&mut self, pipeline: Pipeline, corpus_path: &Path) {
        self.pipeline = Some(Arc::new(pipeline));
        self.corpus_path = Some(corpus_path.to_path_buf());
        tracing::info!("Pipeline ready");
    }

    /// Validate a question and pair it with the current pipeline.
    ///
    /// The returned run borrows nothing from the session, so hosts can
    /// execute it without holding the session.
    pub fn begin(&self, question: &str) -> AppResult<PendingQuestion> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Pipeline("The question is empty".to_string()));
        }

        let pipeline = self.pipeline.clone().ok_or_else(|| {
            AppError::PipelineInitialization(
                "The pipeline is not initialized; load a corpus first".to_string(),
            )
        })?;

        Ok(PendingQuestion {
            question: question.to_string(),
            pipeline,
        })
    }

    /// Append a finished entry.
    pub fn record(&mut self, entry: ConversationEntry) {
        self.history.push(entry);
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    /// Drop every entry; the pipeline is kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn corpus_path(&self) -> Option<&Path> {
        self.corpus_path.as_deref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("initialized", &self.is_initialized())
            .field("corpus_path", &self.corpus_path)
            .field("history", &self.history.len())
            .finish()
    }
}
