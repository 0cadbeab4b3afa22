//! Retrieval type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a snippet came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// A chunk of the indexed corpus
    Document {
        /// File name within the corpus
        source: String,
        /// Chunk position within that file
        position: u32,
    },
    /// A web search result
    Web { url: String, title: String },
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document { source, position } => write!(f, "{} (chunk {})", source, position),
            Self::Web { url, title } if title.is_empty() => write!(f, "{}", url),
            Self::Web { url, title } => write!(f, "{} <{}>", title, url),
        }
    }
}

/// A retrieved passage plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub text: String,
    pub provenance: Provenance,
}

impl Snippet {
    /// Snippet taken from the document corpus.
    pub fn document(text: impl Into<String>, source: impl Into<String>, position: u32) -> Self {
        Self {
            text: text.into(),
            provenance: Provenance::Document {
                source: source.into(),
                position,
            },
        }
    }

    /// Snippet taken from a web result.
    pub fn web(text: impl Into<String>, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: Provenance::Web {
                url: url.into(),
                title: title.into(),
            },
        }
    }

    /// Whether this snippet came from the web tool.
    pub fn is_web(&self) -> bool {
        matches!(self.provenance, Provenance::Web { .. })
    }
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub source: String,
    pub position: u32,
    pub text: String,
}

/// A chunk with its embedding, as held by a vector index.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub source: String,
    pub position: u32,
    pub text: String,
    /// Unit-length embedding vector
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_display() {
        let doc = Snippet::document("text", "paper.pdf", 3);
        assert_eq!(doc.provenance.to_string(), "paper.pdf (chunk 3)");

        let web = Snippet::web("text", "https://example.com", "Example");
        assert_eq!(web.provenance.to_string(), "Example <https://example.com>");
        assert!(web.is_web());
        assert!(!doc.is_web());
    }

    #[test]
    fn test_provenance_serialization_is_tagged() {
        let json = serde_json::to_value(Snippet::web("t", "https://a.b", "")).unwrap();
        assert_eq!(json["provenance"]["kind"], "web");
    }
}
