//! Serve command handler.

use crate::web::{self, AppState};
use clap::Args;
use ragcrew_core::{config::AppConfig, AppError, AppResult};
use ragcrew_pipeline::{ConfigPipelineFactory, Session};
use std::path::PathBuf;
use std::sync::Arc;

/// Serve the web UI
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (default: config server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (default: config server.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Initialize the pipeline with this corpus at startup
    #[arg(long, env = "RAGCREW_CORPUS")]
    pub corpus: Option<PathBuf>,
}

impl ServeCommand {
    /// Execute the serve command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing serve command");
        tracing::debug!("Serve command options: {:?}", self);

        if let Err(e) = config.validate() {
            // The UI reports initialization errors, so keep serving.
            tracing::warn!("Configuration is incomplete: {}", e);
        }

        let mut session = Session::new(Arc::new(ConfigPipelineFactory::new(config.clone())));
        if let Some(ref corpus) = self.corpus {
            if let Err(e) = session.initialize(corpus).await {
                tracing::warn!("Startup initialization failed: {}", e);
            }
        }

        let state = Arc::new(AppState::new(session, config.corpus_path.clone()));
        let app = web::router(state);

        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let port = self.port.unwrap_or(config.server.port);
        let addr = format!("{}:{}", host, port);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("ragcrew UI listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Other(format!("Server error: {}", e)))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
