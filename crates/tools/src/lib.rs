//! Retrieval tools for the answering pipeline.
//!
//! Two tools sit behind the [`RetrievalTool`] seam: a document search over a
//! local corpus, indexed in memory at startup, and a hosted web search.

pub mod chunker;
pub mod document;
pub mod embeddings;
pub mod parser;
pub mod tool;
pub mod types;
pub mod vector_index;
pub mod web_search;

pub use document::DocumentTool;
pub use embeddings::{EmbeddingProvider, TrigramProvider};
pub use tool::RetrievalTool;
pub use types::{Provenance, Snippet};
pub use vector_index::{MemoryIndex, VectorIndex};
pub use web_search::WebSearchTool;
