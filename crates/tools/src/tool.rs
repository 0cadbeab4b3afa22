//! The retrieval tool seam.

use crate::types::Snippet;
use ragcrew_core::AppResult;

/// A capability that turns a query string into an ordered list of snippets.
///
/// Implementations are read-only once constructed so one instance can be
/// shared by every pipeline run.
#[async_trait::async_trait]
pub trait RetrievalTool: Send + Sync {
    /// Tool name used in logs and prompts (e.g., "document_search").
    fn name(&self) -> &str;

    /// Run the query. Failures are reported as `AppError::Retrieval`.
    async fn search(&self, query: &str) -> AppResult<Vec<Snippet>>;
}
