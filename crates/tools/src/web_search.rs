//! Web search via the Tavily search API.

use crate::tool::RetrievalTool;
use crate::types::Snippet;
use ragcrew_core::config::SearchConfig;
use ragcrew_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

/// Retrieval tool that queries a hosted web search API.
pub struct WebSearchTool {
    endpoint: String,
    api_key: String,
    max_results: u32,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        max_results: u32,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Retrieval(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_results: max_results.max(1),
            client,
        })
    }

    /// Build from search settings plus an already-resolved key.
    pub fn from_config(config: &SearchConfig, api_key: impl Into<String>) -> AppResult<Self> {
        Self::new(config.endpoint.clone(), api_key, config.max_results)
    }
}

impl std::fmt::Debug for WebSearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchTool")
            .field("endpoint", &self.endpoint)
            .field("max_results", &self.max_results)
            .finish()
    }
}

#[async_trait::async_trait]
impl RetrievalTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Snippet>> {
        let url = format!("{}/search", self.endpoint);
        let body = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
            search_depth: "basic",
        };

        tracing::debug!("web_search request to {} for {:?}", url, query);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Web search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Retrieval(format!(
                "Web search returned {}: {}",
                status, text
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse search response: {}", e)))?;

        let snippets = into_snippets(parsed, self.max_results as usize);
        tracing::debug!("web_search returned {} results", snippets.len());
        Ok(snippets)
    }
}

fn into_snippets(response: SearchResponse, limit: usize) -> Vec<Snippet> {
    response
        .results
        .into_iter()
        .filter(|r| !r.content.trim().is_empty())
        .take(limit)
        .map(|r| Snippet::web(r.content.trim(), r.url, r.title))
        .collect()
}
