//! Text chunking with configurable size and overlap.

use crate::types::ChunkCandidate;

/// Chunk text into overlapping segments of at most `chunk_size` bytes.
///
/// Boundaries always fall on UTF-8 character boundaries and, when a
/// whitespace break exists in the back half of the window, on whitespace.
/// A short trailing remainder already covered by the previous chunk's
/// overlap is dropped.
pub fn chunk_text(
    source: &str,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Vec<ChunkCandidate> {
    let text = text.trim();
    if text.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    while start < text.len() {
        let end = chunk_end(text, start, chunk_size);
        let piece = text[start..end].trim();

        let is_tail = end == text.len() && !chunks.is_empty();
        if is_tail && piece.len() <= overlap {
            break;
        }

        if !piece.is_empty() {
            chunks.push(ChunkCandidate {
                source: source.to_string(),
                position,
                text: piece.to_string(),
            });
            position += 1;
        }

        if end == text.len() {
            break;
        }

        // A window cut short at a word boundary can be narrower than the
        // overlap; then step half of it so neighbours still share text.
        let consumed = end - start;
        let step = if consumed > overlap {
            consumed - overlap
        } else {
            consumed / 2
        };
        start = ceil_char_boundary(text, start + step.max(1));
    }

    tracing::debug!(
        "Chunked {} into {} chunks (size: {}, overlap: {})",
        source,
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

/// End offset for a window starting at `start`.
fn chunk_end(text: &str, start: usize, chunk_size: usize) -> usize {
    let hard_end = start + chunk_size;
    if hard_end >= text.len() {
        return text.len();
    }

    let mut end = hard_end;
    while end > start && !text.is_char_boundary(end) {
        end -= 1;
    }

    let window = &text[start..end];
    match window.rfind(char::is_whitespace) {
        Some(ws) if ws >= window.len() / 2 => start + ws,
        _ if end > start => end,
        // Window narrower than one character: take the whole character
        _ => ceil_char_boundary(text, start + 1),
    }
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx.min(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_basic() {
        let text = "word ".repeat(400);
        let chunks = chunk_text("doc.txt", &text, 200, 50);

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].position, 0);
        assert_eq!(chunks[1].position, 1);
        assert!(chunks.iter().all(|c| c.text.len() <= 200));
        assert!(chunks.iter().all(|c| c.source == "doc.txt"));
    }

    #[test]
    fn test_chunk_text_no_overlap() {
        let text = "a".repeat(300);
        let chunks = chunk_text("doc.txt", &text, 100, 0);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("doc.txt", "Attention is all you need.", 800, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Attention is all you need.");
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("doc.txt", "", 100, 10).is_empty());
        assert!(chunk_text("doc.txt", "   \n ", 100, 10).is_empty());
    }

    #[test]
    fn test_chunk_text_with_overlap() {
        let text = (0..100).map(|i| format!("w{} ", i)).collect::<String>();
        let chunks = chunk_text("doc.txt", &text, 60, 20);

        assert!(chunks.len() >= 2);
        let first_last_word = chunks[0].text.split_whitespace().last().unwrap();
        assert!(chunks[1].text.contains(first_last_word));
    }

    #[test]
    fn test_chunk_text_utf8_safety() {
        let text = "Gamedex é um aplicativo 🎮 brasileiro ".repeat(20);
        let chunks = chunk_text("doc.txt", &text, 37, 5);
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_overlap_survives_short_windows() {
        let text = (0..200).map(|i| format!("w{} ", i)).collect::<String>();
        let chunks = chunk_text("doc.txt", &text, 60, 58);

        assert!(chunks.len() >= 2);
        for pair in chunks.windows(2) {
            let last_word = pair[0].text.split_whitespace().last().unwrap();
            assert!(
                pair[1].text.contains(last_word),
                "{:?} and {:?} share no text",
                pair[0].text,
                pair[1].text
            );
        }
    }
}
