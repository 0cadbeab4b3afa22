//! Document search over a local corpus.

use crate::chunker::chunk_text;
use crate::embeddings::{EmbeddingProvider, TrigramProvider};
use crate::parser;
use crate::tool::RetrievalTool;
use crate::types::{IndexedChunk, Snippet};
use crate::vector_index::{MemoryIndex, VectorIndex};
use ragcrew_core::config::RetrievalConfig;
use ragcrew_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Retrieval tool backed by an in-memory index of one file or a directory.
pub struct DocumentTool {
    corpus_path: PathBuf,
    index: MemoryIndex,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    min_score: f32,
}

impl std::fmt::Debug for DocumentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentTool")
            .field("corpus_path", &self.corpus_path)
            .field("chunks", &self.index.len())
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl DocumentTool {
    /// Parse, chunk and embed the corpus at `path`.
    ///
    /// A missing path, or a corpus that yields no chunks, is reported as
    /// `AppError::PipelineInitialization`. Inside a directory, files that
    /// cannot be parsed are skipped with a warning.
    pub async fn open(path: &Path, config: &RetrievalConfig) -> AppResult<Self> {
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(TrigramProvider::new(config.embedding_dim as usize));
        Self::open_with_embedder(path, config, embedder).await
    }

    pub async fn open_with_embedder(
        path: &Path,
        config: &RetrievalConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AppResult<Self> {
        let start = Instant::now();
        config.validate()?;

        if !path.exists() {
            return Err(AppError::PipelineInitialization(format!(
                "Corpus not found: {}",
                path.display()
            )));
        }

        tracing::info!("Indexing corpus {:?}", path);

        let root = path.to_path_buf();
        let documents = tokio::task::spawn_blocking(move || read_corpus(&root))
            .await
            .map_err(|e| AppError::Other(format!("Corpus reader task failed: {}", e)))??;

        let mut index = MemoryIndex::new();
        for (source, text) in documents {
            let candidates = chunk_text(
                &source,
                &text,
                config.chunk_size as usize,
                config.chunk_overlap as usize,
            );
            if candidates.is_empty() {
                continue;
            }

            let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
            let embeddings = embedder.embed_batch(&texts).await?;

            for (candidate, embedding) in candidates.into_iter().zip(embeddings) {
                index.upsert_chunk(IndexedChunk {
                    source: candidate.source,
                    position: candidate.position,
                    text: candidate.text,
                    embedding,
                })?;
            }
        }

        if index.is_empty() {
            return Err(AppError::PipelineInitialization(format!(
                "Corpus {} produced no searchable text",
                path.display()
            )));
        }

        tracing::info!(
            "Indexed {} chunks from {:?} in {:.2}s ({} embeddings, {} dims)",
            index.len(),
            path,
            start.elapsed().as_secs_f64(),
            embedder.provider_name(),
            embedder.dimensions()
        );

        Ok(Self {
            corpus_path: path.to_path_buf(),
            index,
            embedder,
            top_k: config.top_k.max(1) as usize,
            min_score: config.min_score,
        })
    }

    pub fn corpus_path(&self) -> &Path {
        &self.corpus_path
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

#[async_trait::async_trait]
impl RetrievalTool for DocumentTool {
    fn name(&self) -> &str {
        "document_search"
    }

    async fn search(&self, query: &str) -> AppResult<Vec<Snippet>> {
        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            AppError::Retrieval(format!("Failed to embed query: {}", e))
        })?;

        let results = self
            .index
            .search(&query_embedding, self.top_k, self.min_score)?;

        tracing::debug!(
            "document_search returned {} chunks for query {:?}",
            results.len(),
            query
        );

        Ok(results
            .into_iter()
            .map(|(chunk, _score)| Snippet::document(chunk.text, chunk.source, chunk.position))
            .collect())
    }
}

/// Read every parseable file under `root` as (source name, text) pairs.
fn read_corpus(root: &Path) -> AppResult<Vec<(String, String)>> {
    if root.is_file() {
        let text = parser::parse_file(root)
            .map_err(|e| AppError::PipelineInitialization(e.to_string()))?;
        return Ok(vec![(source_name(root, root), text)]);
    }

    let mut documents = Vec::new();
    let mut entries: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    entries.sort();

    for path in entries {
        match parser::parse_file(&path) {
            Ok(text) => documents.push((source_name(root, &path), text)),
            Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
        }
    }

    Ok(documents)
}

fn source_name(root: &Path, path: &Path) -> String {
    let relative = if root == path {
        path.file_name().map(Path::new).unwrap_or(path)
    } else {
        path.strip_prefix(root).unwrap_or(path)
    };
    relative.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn small_config() -> RetrievalConfig {
        RetrievalConfig {
            chunk_size: 200,
            chunk_overlap: 20,
            top_k: 2,
            min_score: 0.0,
            embedding_dim: 256,
        }
    }

    #[tokio::test]
    async fn test_open_single_file_and_search() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("paper.md");
        fs::write(
            &file,
            "# Attention\n\nThe Transformer relies entirely on self-attention to compute \
             representations of its input and output.\n\n# Training\n\nWe trained on the \
             WMT 2014 English-German dataset with byte-pair encoding.",
        )
        .unwrap();

        let tool = DocumentTool::open(&file, &small_config()).await.unwrap();
        assert!(tool.chunk_count() >= 1);
        assert_eq!(tool.name(), "document_search");

        let results = tool.search("self-attention representations").await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 2);
        assert!(results[0].text.contains("self-attention"));
        assert!(!results[0].is_web());
    }

    #[tokio::test]
    async fn test_open_directory_skips_binary_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "Positional encodings use sine waves.").unwrap();
        fs::write(dir.path().join("blob.bin"), [0u8, 159, 146, 150]).unwrap();

        let tool = DocumentTool::open(dir.path(), &small_config()).await.unwrap();
        assert_eq!(tool.chunk_count(), 1);

        let results = tool.search("positional encodings").await.unwrap();
        assert_eq!(
            results[0].provenance.to_string(),
            "notes.txt (chunk 0)"
        );
    }

    #[tokio::test]
    async fn test_overlap_not_below_chunk_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "Positional encodings use sine waves.").unwrap();

        let config = RetrievalConfig {
            chunk_overlap: 200,
            ..small_config()
        };
        let err = DocumentTool::open(dir.path(), &config).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_missing_corpus_is_initialization_error() {
        let dir = TempDir::new().unwrap();
        let err = DocumentTool::open(&dir.path().join("nope.pdf"), &small_config())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PipelineInitialization(_)));
    }

    #[tokio::test]
    async fn test_empty_corpus_is_initialization_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("empty.txt"), "   \n").unwrap();

        let err = DocumentTool::open(dir.path(), &small_config())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PipelineInitialization(_)));
    }
}
