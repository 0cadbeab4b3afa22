//! Typed task graph for the five-stage pipeline.
//!
//! The graph is data, not code: each stage names the role that performs it,
//! the task template it renders, its dependencies and the tools it may use.
//! [`TaskGraph::new`] rejects any wiring that differs from the linear
//! Route → Retrieve → Grade → CheckHallucination → Answer chain.

use ragcrew_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Route,
    Retrieve,
    Grade,
    CheckHallucination,
    Answer,
}

impl StageKind {
    pub const ORDER: [StageKind; 5] = [
        StageKind::Route,
        StageKind::Retrieve,
        StageKind::Grade,
        StageKind::CheckHallucination,
        StageKind::Answer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Retrieve => "retrieve",
            Self::Grade => "grade",
            Self::CheckHallucination => "check_hallucination",
            Self::Answer => "answer",
        }
    }

    fn position(&self) -> usize {
        match self {
            Self::Route => 0,
            Self::Retrieve => 1,
            Self::Grade => 2,
            Self::CheckHallucination => 3,
            Self::Answer => 4,
        }
    }

    /// Tools this stage may be bound to.
    fn allowed_tools(&self) -> &'static [ToolBinding] {
        match self {
            Self::Retrieve => &[ToolBinding::Document, ToolBinding::Web],
            Self::Answer => &[ToolBinding::Web],
            _ => &[],
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolBinding {
    Document,
    Web,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDescriptor {
    pub kind: StageKind,
    pub role_id: String,
    pub task_id: String,
    #[serde(default)]
    pub depends_on: Vec<StageKind>,
    #[serde(default)]
    pub tools: Vec<ToolBinding>,
}

impl StageDescriptor {
    pub fn new(kind: StageKind, role_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            kind,
            role_id: role_id.into(),
            task_id: task_id.into(),
            depends_on: Vec::new(),
            tools: Vec::new(),
        }
    }

    pub fn after(mut self, stage: StageKind) -> Self {
        self.depends_on.push(stage);
        self
    }

    pub fn with_tool(mut self, tool: ToolBinding) -> Self {
        self.tools.push(tool);
        self
    }
}

/// Validated stage list.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGraph {
    stages: Vec<StageDescriptor>,
}

impl TaskGraph {
    /// Validate and build a graph.
    pub fn new(stages: Vec<StageDescriptor>) -> AppResult<Self> {
        if stages.len() != StageKind::ORDER.len() {
            return Err(invalid(format!(
                "expected {} stages, got {}",
                StageKind::ORDER.len(),
                stages.len()
            )));
        }

        for (stage, expected) in stages.iter().zip(StageKind::ORDER) {
            if stage.kind != expected {
                return Err(invalid(format!(
                    "stage '{}' found where '{}' was expected",
                    stage.kind, expected
                )));
            }

            if stage.role_id.trim().is_empty() || stage.task_id.trim().is_empty() {
                return Err(invalid(format!(
                    "stage '{}' needs a role and a task",
                    stage.kind
                )));
            }

            for dep in &stage.depends_on {
                if dep.position() >= stage.kind.position() {
                    return Err(invalid(format!(
                        "stage '{}' depends on '{}', which does not run before it",
                        stage.kind, dep
                    )));
                }
            }

            let position = stage.kind.position();
            if position > 0 {
                let predecessor = StageKind::ORDER[position - 1];
                if !stage.depends_on.contains(&predecessor) {
                    return Err(invalid(format!(
                        "stage '{}' must depend on '{}'",
                        stage.kind, predecessor
                    )));
                }
            }

            let allowed = stage.kind.allowed_tools();
            for tool in &stage.tools {
                if !allowed.contains(tool) {
                    return Err(invalid(format!(
                        "stage '{}' cannot use the {:?} tool",
                        stage.kind, tool
                    )));
                }
            }
            if allowed.iter().any(|tool| !stage.tools.contains(tool)) {
                return Err(invalid(format!(
                    "stage '{}' must be bound to {:?}",
                    stage.kind, allowed
                )));
            }
        }

        Ok(Self { stages })
    }

    /// The canonical graph with the default role and task ids.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                StageDescriptor::new(StageKind::Route, "router", "route"),
                StageDescriptor::new(StageKind::Retrieve, "retriever", "retrieve")
                    .after(StageKind::Route)
                    .with_tool(ToolBinding::Document)
                    .with_tool(ToolBinding::Web),
                StageDescriptor::new(StageKind::Grade, "grader", "grade")
                    .after(StageKind::Retrieve),
                StageDescriptor::new(
                    StageKind::CheckHallucination,
                    "hallucination_grader",
                    "check_hallucination",
                )
                .after(StageKind::Grade),
                StageDescriptor::new(StageKind::Answer, "answer_grader", "answer")
                    .after(StageKind::CheckHallucination)
                    .with_tool(ToolBinding::Web),
            ],
        }
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    pub fn stage(&self, kind: StageKind) -> &StageDescriptor {
        // Validation guarantees one descriptor per kind at its position.
        &self.stages[kind.position()]
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::standard()
    }
}

fn invalid(message: String) -> AppError {
    AppError::PipelineInitialization(format!("Invalid task graph: {}", message))
}
