//! JSON API handlers.

use super::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use ragcrew_core::AppError;
use ragcrew_pipeline::{build_pipeline, ConversationEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusData {
    pub initialized: bool,
    pub corpus_path: Option<String>,
    pub history_len: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct InitializeRequest {
    #[serde(default)]
    pub corpus_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatusData>> {
    let session = state.session.lock().await;
    Json(ApiResponse::ok(StatusData {
        initialized: session.is_initialized(),
        corpus_path: session.corpus_path().map(|p| p.display().to_string()),
        history_len: session.history().len(),
        uptime_secs: state.started.elapsed().as_secs(),
    }))
}

// POST /api/initialize
pub async fn initialize(
    State(state): State<Arc<AppState>>,
    Json(req): Json<InitializeRequest>,
) -> (StatusCode, Json<ApiResponse<StatusData>>) {
    let corpus = req
        .corpus_path
        .filter(|p| !p.trim().is_empty())
        .map(|p| PathBuf::from(p.trim()))
        .unwrap_or_else(|| state.default_corpus.clone());

    let _turn = state.turn.lock().await;
    let factory = state.session.lock().await.factory();

    match build_pipeline(factory.as_ref(), &corpus).await {
        Ok(pipeline) => {
            let mut session = state.session.lock().await;
            session.install(pipeline, &corpus);
            (
                StatusCode::OK,
                Json(ApiResponse::ok(StatusData {
                    initialized: true,
                    corpus_path: Some(corpus.display().to_string()),
                    history_len: session.history().len(),
                    uptime_secs: state.started.elapsed().as_secs(),
                })),
            )
        }
        Err(e) => {
            tracing::warn!("Initialization failed: {}", e);
            (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string())))
        }
    }
}

// POST /api/ask
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> (StatusCode, Json<ApiResponse<ConversationEntry>>) {
    if req.question.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("Please enter a question")),
        );
    }

    let _turn = state.turn.lock().await;
    let pending = state.session.lock().await.begin(&req.question);
    let pending = match pending {
        Ok(pending) => pending,
        Err(AppError::PipelineInitialization(msg)) => {
            return (StatusCode::CONFLICT, Json(ApiResponse::err(msg)));
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(e.to_string())),
            );
        }
    };

    let entry = pending.run().await;
    state.session.lock().await.record(entry.clone());
    (StatusCode::OK, Json(ApiResponse::ok(entry)))
}

// GET /api/history
pub async fn history(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<ConversationEntry>>> {
    let session = state.session.lock().await;
    Json(ApiResponse::ok(session.history().to_vec()))
}

// POST /api/history/clear
pub async fn clear_history(State(state): State<Arc<AppState>>) -> Json<ApiResponse<bool>> {
    state.session.lock().await.clear_history();
    Json(ApiResponse::ok(true))
}
