use crate::orchestrator::Pipeline;
use crate::session::PipelineFactory;
use ragcrew_core::{AppError, AppResult};
use ragcrew_llm::ScriptedClient;
use ragcrew_prompt::PromptSet;
use ragcrew_tools::{RetrievalTool, Snippet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Retrieval tool returning a fixed result and counting calls.
pub struct StubTool {
    name: &'static str,
    result: Result<Vec<Snippet>, String>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl StubTool {
    pub fn returning(name: &'static str, snippets: Vec<Snippet>) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: Ok(snippets),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            result: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl RetrievalTool for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Snippet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        self.result.clone().map_err(AppError::Retrieval)
    }
}

pub fn doc_snippets() -> Vec<Snippet> {
    vec![
        Snippet::document(
            "The Transformer is based solely on attention mechanisms.",
            "attention.pdf",
            0,
        ),
        Snippet::document("BLEU of 28.4 on WMT 2014 English-to-German.", "attention.pdf", 7),
    ]
}

pub fn web_snippets() -> Vec<Snippet> {
    vec![Snippet::web(
        "Recent models extend the Transformer architecture.",
        "https://news.example/transformers",
        "Transformer news",
    )]
}

/// One scripted client per role, so each stage's calls can be counted.
pub struct Harness {
    pub router: Arc<ScriptedClient>,
    pub retriever: Arc<ScriptedClient>,
    pub grader: Arc<ScriptedClient>,
    pub checker: Arc<ScriptedClient>,
    pub answerer: Arc<ScriptedClient>,
    pub document: Arc<StubTool>,
    pub web: Arc<StubTool>,
}

impl Harness {
    pub fn new(document: Arc<StubTool>, web: Arc<StubTool>) -> Self {
        Self {
            router: Arc::new(ScriptedClient::default()),
            retriever: Arc::new(ScriptedClient::default()),
            grader: Arc::new(ScriptedClient::default()),
            checker: Arc::new(ScriptedClient::default()),
            answerer: Arc::new(ScriptedClient::default()),
            document,
            web,
        }
    }

    pub fn router(mut self, replies: &[&str]) -> Self {
        self.router = Arc::new(ScriptedClient::new(replies.iter().copied()));
        self
    }

    pub fn retriever(mut self, replies: &[&str]) -> Self {
        self.retriever = Arc::new(ScriptedClient::new(replies.iter().copied()));
        self
    }

    pub fn grader(mut self, replies: &[&str]) -> Self {
        self.grader = Arc::new(ScriptedClient::new(replies.iter().copied()));
        self
    }

    pub fn checker(mut self, replies: &[&str]) -> Self {
        self.checker = Arc::new(ScriptedClient::new(replies.iter().copied()));
        self
    }

    pub fn answerer(mut self, replies: &[&str]) -> Self {
        self.answerer = Arc::new(ScriptedClient::new(replies.iter().copied()));
        self
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::builder(PromptSet::defaults().unwrap())
            .role_model("router", self.router.clone(), "m", 0.0)
            .role_model("retriever", self.retriever.clone(), "m", 0.0)
            .role_model("grader", self.grader.clone(), "m", 0.0)
            .role_model("hallucination_grader", self.checker.clone(), "m", 0.0)
            .role_model("answer_grader", self.answerer.clone(), "m", 0.0)
            .document_tool(self.document.clone())
            .web_tool(self.web.clone())
            .build()
            .unwrap()
    }
}

type BuildFn = dyn Fn(&Path) -> AppResult<Pipeline> + Send + Sync;

/// Factory delegating to a closure; counts builds.
pub struct FnFactory {
    build: Box<BuildFn>,
    pub builds: AtomicUsize,
}

impl FnFactory {
    pub fn new(build: impl Fn(&Path) -> AppResult<Pipeline> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            build: Box::new(build),
            builds: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl PipelineFactory for FnFactory {
    async fn build(&self, corpus_path: &Path) -> AppResult<Pipeline> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        (self.build)(corpus_path)
    }
}
