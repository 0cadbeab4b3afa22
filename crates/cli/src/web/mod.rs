//! Web UI host.
//!
//! One HTML page plus a small JSON API over a shared [`Session`].
//! Questions and re-initializations take turns in arrival order. The
//! session itself is only locked for bookkeeping, so status and history
//! stay readable while a question is being answered.

mod page;
mod routes;

use axum::routing::{get, post};
use axum::Router;
use ragcrew_pipeline::Session;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub session: Mutex<Session>,
    /// Held for the whole of an ask or initialize
    pub turn: Mutex<()>,
    /// Used when an initialize request names no corpus
    pub default_corpus: PathBuf,
    pub started: Instant,
}

impl AppState {
    pub fn new(session: Session, default_corpus: PathBuf) -> Self {
        Self {
            session: Mutex::new(session),
            turn: Mutex::new(()),
            default_corpus,
            started: Instant::now(),
        }
    }
}

/// JSON envelope for every API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/api/status", get(routes::status))
        .route("/api/initialize", post(routes::initialize))
        .route("/api/ask", post(routes::ask))
        .route("/api/history", get(routes::history))
        .route("/api/history/clear", post(routes::clear_history))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
