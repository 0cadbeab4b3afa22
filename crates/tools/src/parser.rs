//! Corpus file parsing and text extraction.

use ragcrew_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Markdown,
    Html,
    Code,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("pdf") => Self::Pdf,
            Some("md") | Some("markdown") => Self::Markdown,
            Some("html") | Some("htm") => Self::Html,
            Some("rs") | Some("py") | Some("js") | Some("ts") | Some("go") | Some("c")
            | Some("cpp") | Some("java") | Some("sh") | Some("yaml") | Some("yml")
            | Some("json") | Some("toml") => Self::Code,
            Some("txt") | Some("rst") | Some("csv") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Code => "code",
            Self::PlainText => "text",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse a corpus file and extract clean text.
pub fn parse_file(path: &Path) -> AppResult<String> {
    let content_type = ContentType::from_path(path);
    tracing::debug!("Parsing {:?} as {}", path, content_type.as_str());

    if content_type == ContentType::Pdf {
        return parse_pdf(path);
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Retrieval(format!("Failed to read {:?}: {}", path, e)))?;

    if content_type == ContentType::Unknown && raw.contains('\0') {
        tracing::warn!("Skipping likely binary file: {:?}", path);
        return Err(AppError::Retrieval(format!(
            "Binary file not supported: {:?}",
            path
        )));
    }

    let cleaned = match content_type {
        ContentType::Markdown => clean_markdown(&raw),
        ContentType::Html => clean_html(&raw),
        _ => normalize_whitespace_lines(&raw),
    };

    Ok(cleaned)
}

fn parse_pdf(path: &Path) -> AppResult<String> {
    let text = pdf_extract::extract_text(path).map_err(|e| {
        AppError::Retrieval(format!("Failed to extract text from {:?}: {}", path, e))
    })?;
    Ok(normalize_whitespace_lines(&text))
}

/// Collapse runs of spaces inside lines and drop blank lines.
///
/// PDF extraction in particular emits ragged spacing and many empty lines.
fn normalize_whitespace_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Clean markdown by removing heading markers, rules and fences.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim_start_matches('#').trim();

        if trimmed.starts_with("---") || trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        if !trimmed.is_empty() {
            result.push_str(trimmed);
            result.push('\n');
        }
    }

    result.trim().to_string()
}

/// Clean HTML by stripping tags, scripts and styles.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut in_tag = false;
    let mut skip_until: Option<&str> = None;

    // ASCII lowering keeps byte offsets aligned with `text`
    let lower = text.to_ascii_lowercase();

    for (i, ch) in text.char_indices() {
        if let Some(close) = skip_until {
            if lower[i..].starts_with(close) {
                skip_until = None;
                in_tag = true;
            }
            continue;
        }

        match ch {
            '<' => {
                in_tag = true;
                if lower[i..].starts_with("<script") {
                    skip_until = Some("</script");
                } else if lower[i..].starts_with("<style") {
                    skip_until = Some("</style");
                }
            }
            '>' if in_tag => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(ch),
            _ => {}
        }
    }

    result.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(ContentType::from_path(Path::new("paper.PDF")), ContentType::Pdf);
        assert_eq!(ContentType::from_path(Path::new("file.md")), ContentType::Markdown);
        assert_eq!(ContentType::from_path(Path::new("file.rs")), ContentType::Code);
        assert_eq!(ContentType::from_path(Path::new("file.txt")), ContentType::PlainText);
        assert_eq!(ContentType::from_path(Path::new("file")), ContentType::Unknown);
    }

    #[test]
    fn test_clean_markdown() {
        let input = "# Header\n\nSome text\n\n```rust\ncode\n```\n\nMore text";
        let output = clean_markdown(input);
        assert!(output.contains("Header"));
        assert!(output.contains("Some text"));
        assert!(output.contains("More text"));
        assert!(!output.contains("```"));
    }

    #[test]
    fn test_clean_html() {
        let input = "<html><head><style>p { color: red; }</style></head>\
                     <body><p>Hello <b>world</b></p><script>alert(1)</script></body></html>";
        assert_eq!(clean_html(input), "Hello world");
    }

    #[test]
    fn test_normalize_whitespace_lines() {
        let input = "Attention   is\n\n\n  all you   need  \n";
        assert_eq!(normalize_whitespace_lines(input), "Attention is\nall you need");
    }

    #[test]
    fn test_parse_missing_file_is_retrieval_error() {
        let result = parse_file(Path::new("/definitely/not/here.txt"));
        assert!(matches!(result, Err(AppError::Retrieval(_))));
    }
}
