//! Configuration management for ragcrew.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.ragcrew/config.yaml`, or `RAGCREW_CONFIG`)
//! - `.env` file and environment variables
//! - Command-line flags
//!
//! Credentials are never stored in the config file itself; providers name the
//! environment variable that holds their key (`apiKeyEnv`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 4] = ["openrouter", "groq", "openai", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .ragcrew/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Default LLM provider for every agent role
    pub provider: String,

    /// Default model identifier for every agent role
    pub model: String,

    /// Explicit API key override (applies to the default provider)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// LLM provider configurations and per-role overrides
    pub llm: LlmConfig,

    /// Web search provider settings
    pub search: SearchConfig,

    /// Document retrieval settings
    pub retrieval: RetrievalConfig,

    /// Document corpus bound at initialization
    pub corpus_path: PathBuf,

    /// Web UI bind address
    pub server: ServerConfig,
}

/// LLM configuration from config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Per-role overrides keyed by role id (router, retriever, grader, ...)
    #[serde(default)]
    pub roles: HashMap<String, RoleModelConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();

        providers.insert(
            "openrouter".to_string(),
            ProviderConfig::OpenAiCompatible {
                api_key_env: "OPEN_ROUTER_API_KEY".to_string(),
                model: "deepseek/deepseek-r1".to_string(),
                endpoint: None,
            },
        );
        providers.insert(
            "groq".to_string(),
            ProviderConfig::OpenAiCompatible {
                api_key_env: "GROQ_API_KEY".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                endpoint: None,
            },
        );
        providers.insert(
            "ollama".to_string(),
            ProviderConfig::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
                timeout: Some(120),
            },
        );

        Self {
            active_provider: "openrouter".to_string(),
            providers,
            roles: HashMap::new(),
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    /// Any chat-completions compatible endpoint (OpenRouter, Groq, OpenAI)
    OpenAiCompatible {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        endpoint: Option<String>,
    },
    Ollama {
        endpoint: String,
        model: String,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Model configured for this provider.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAiCompatible { model, .. } => model,
            Self::Ollama { model, .. } => model,
        }
    }

    /// Custom endpoint, if any.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAiCompatible { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            Self::OpenAiCompatible { api_key_env, .. } => Some(api_key_env),
            Self::Ollama { .. } => None,
        }
    }
}

/// Per-role model override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleModelConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
}

/// Fully resolved model binding for one agent role.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBinding {
    pub provider: String,
    pub model: String,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub temperature: f32,
}

/// Web search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(rename = "apiKeyEnv", default = "default_search_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(rename = "maxResults", default = "default_max_results")]
    pub max_results: u32,
}

fn default_search_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_search_endpoint() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            endpoint: default_search_endpoint(),
            max_results: default_max_results(),
        }
    }
}

/// Document retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(rename = "chunkSize", default = "default_chunk_size")]
    pub chunk_size: u32,

    #[serde(rename = "chunkOverlap", default = "default_chunk_overlap")]
    pub chunk_overlap: u32,

    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: u32,

    #[serde(rename = "minScore", default = "default_min_score")]
    pub min_score: f32,

    #[serde(rename = "embeddingDim", default = "default_embedding_dim")]
    pub embedding_dim: u32,
}

fn default_chunk_size() -> u32 {
    800
}

fn default_chunk_overlap() -> u32 {
    100
}

fn default_top_k() -> u32 {
    4
}

fn default_min_score() -> f32 {
    0.10
}

fn default_embedding_dim() -> u32 {
    384
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            min_score: default_min_score(),
            embedding_dim: default_embedding_dim(),
        }
    }
}

impl RetrievalConfig {
    /// Chunks must advance: the overlap has to be smaller than the chunk.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("retrieval.chunkSize must be positive".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "retrieval.chunkOverlap ({}) must be smaller than retrieval.chunkSize ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.embedding_dim == 0 {
            return Err(AppError::Config("retrieval.embeddingDim must be positive".to_string()));
        }
        Ok(())
    }
}

/// Web UI bind address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmConfig>,
    search: Option<SearchConfig>,
    retrieval: Option<RetrievalConfig>,
    corpus: Option<CorpusConfig>,
    server: Option<ServerConfig>,
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CorpusConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let llm = LlmConfig::default();
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: llm.active_provider.clone(),
            model: "deepseek/deepseek-r1".to_string(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm,
            search: SearchConfig::default(),
            retrieval: RetrievalConfig::default(),
            corpus_path: PathBuf::from("data/attention_is_all_you_need.pdf"),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, environment variables and defaults.
    ///
    /// Environment variables:
    /// - `RAGCREW_WORKSPACE`: Override workspace path
    /// - `RAGCREW_CONFIG`: Path to config file
    /// - `RAGCREW_PROVIDER`: Default LLM provider
    /// - `RAGCREW_MODEL`: Default model identifier
    /// - `RAGCREW_API_KEY`: API key for the default provider
    /// - `RAGCREW_CORPUS`: Document corpus path
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use ragcrew_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Corpus: {:?}", config.corpus_path);
    /// ```
    pub fn load() -> AppResult<Self> {
        // A missing .env is normal; keys may come from the real environment
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(AppError::Config(format!("Failed to read .env file: {}", e)));
            }
        }

        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("RAGCREW_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("RAGCREW_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.ragcrew_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("RAGCREW_PROVIDER") {
            config.provider = provider;
            config.model = config.default_model_for(&config.provider);
        }

        if let Ok(model) = std::env::var("RAGCREW_MODEL") {
            config.model = model;
        }

        if let Ok(corpus) = std::env::var("RAGCREW_CORPUS") {
            config.corpus_path = PathBuf::from(corpus);
        }

        config.api_key = std::env::var("RAGCREW_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(ws) = config_file.workspace {
            if let Some(path) = ws.path {
                result.workspace = PathBuf::from(path);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            // Providers from the file extend the built-in ones
            let mut merged = LlmConfig::default();
            merged.providers.extend(llm.providers);
            merged.roles = llm.roles;
            merged.active_provider = llm.active_provider;

            result.llm = merged;
            result.provider = result.llm.active_provider.clone();
            result.model = result.default_model_for(&result.provider);
        }

        if let Some(search) = config_file.search {
            result.search = search;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(corpus) = config_file.corpus {
            if let Some(path) = corpus.path {
                result.corpus_path = PathBuf::from(path);
            }
        }

        if let Some(server) = config_file.server {
            result.server = server;
        }

        tracing::debug!("Merged config file {:?}", path);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.model = self.default_model_for(&provider);
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .ragcrew directory.
    pub fn ragcrew_dir(&self) -> PathBuf {
        self.workspace.join(".ragcrew")
    }

    /// Directory holding role/task definition overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.ragcrew_dir().join("prompts")
    }

    /// Resolve a corpus path relative to the workspace.
    pub fn resolve_corpus_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Get a provider configuration by name.
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.providers.get(provider)
    }

    fn default_model_for(&self, provider: &str) -> String {
        self.get_provider_config(provider)
            .map(|pc| pc.model().to_string())
            .unwrap_or_else(|| self.model.clone())
    }

    /// Resolve the API key for a provider.
    ///
    /// `RAGCREW_API_KEY` only applies to the default provider; other
    /// providers read the variable named by their `apiKeyEnv`.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if provider == self.provider {
            if let Some(ref key) = self.api_key {
                return Some(key.clone());
            }
        }

        self.get_provider_config(provider)
            .and_then(|pc| pc.api_key_env())
            .and_then(|env_var| std::env::var(env_var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Resolve provider, model, endpoint, key and temperature for a role.
    pub fn model_binding(&self, role_id: &str) -> ModelBinding {
        let role = self.llm.roles.get(role_id).cloned().unwrap_or_default();

        let provider = role.provider.unwrap_or_else(|| self.provider.clone());
        let model = match role.model {
            Some(model) => model,
            None if provider == self.provider => self.model.clone(),
            None => self.default_model_for(&provider),
        };
        let endpoint = self
            .get_provider_config(&provider)
            .and_then(|pc| pc.endpoint())
            .map(str::to_string);
        let api_key = self.resolve_api_key(&provider);

        ModelBinding {
            provider,
            model,
            endpoint,
            api_key,
            temperature: role.temperature.unwrap_or(0.0),
        }
    }

    /// Read the web search API key from the configured variable.
    pub fn search_api_key(&self) -> AppResult<String> {
        std::env::var(&self.search.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(format!(
                    "{} not found in environment variables. Please set it in your .env file.",
                    self.search.api_key_env
                ))
            })
    }

    /// Validate configuration for every provider in use and the search key.
    pub fn validate(&self) -> AppResult<()> {
        let mut providers: Vec<String> = vec![self.provider.clone()];
        for role in self.llm.roles.values() {
            if let Some(ref p) = role.provider {
                if !providers.contains(p) {
                    providers.push(p.clone());
                }
            }
        }

        for provider in &providers {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                )));
            }

            if let Some(env_var) = self
                .get_provider_config(provider)
                .and_then(|pc| pc.api_key_env())
            {
                if self.resolve_api_key(provider).is_none() {
                    return Err(AppError::Config(format!(
                        "{} not found in environment variables. Please set it in your .env file.",
                        env_var
                    )));
                }
            }
        }

        self.search_api_key()?;
        self.retrieval.validate()
    }
}
