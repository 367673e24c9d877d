//! Recursive, overlap-aware text chunker.
//!
//! Splits document text into [`Chunk`]s of at most `chunk_size` characters,
//! carrying `chunk_overlap` characters from the end of one chunk into the
//! start of the next. Splits prefer semantic boundaries.
//!
//! # Algorithm
//!
//! 1. Pick the first separator in `["\n\n", "\n", ". ", " ", ""]` that occurs
//!    in the text (`""` means "between any two characters").
//! 2. Split on it, keeping the separator at the end of each piece so that
//!    concatenating pieces reproduces the text.
//! 3. Pieces shorter than `chunk_size` are merged greedily into a sliding
//!    window. When the window would overflow it is emitted, then pieces are
//!    dropped from its front until at most `chunk_overlap` characters remain.
//! 4. Pieces that are too long on their own are split again with the next
//!    separator in the list.
//! 5. Emitted chunks are whitespace-trimmed; empty chunks are dropped.
//!
//! Lengths are measured in `char`s, so multi-byte text never splits inside
//! a code point.
//!
//! # Example
//!
//! ```rust
//! use research_harness_core::chunk::Chunker;
//!
//! let chunker = Chunker::new(1000, 200).unwrap();
//! let pieces = chunker.split_text(&"x".repeat(2500));
//! assert_eq!(pieces.len(), 3);
//! ```

use std::collections::VecDeque;

use anyhow::{bail, Result};
use tracing::{debug, warn};

use crate::models::{Chunk, ChunkMetadata, Document, DocumentProvenance};

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default number of characters shared by neighbouring chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Separator preference: paragraph, line, sentence, word, character.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Splits text into overlapping, size-bounded chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    /// Create a chunker. `chunk_overlap` must be smaller than `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            bail!("chunk_size must be > 0");
        }
        if chunk_overlap >= chunk_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap,
                chunk_size
            );
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into trimmed, non-empty segments.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        if text.trim().is_empty() {
            return out;
        }
        self.split_recursive(text, &SEPARATORS, &mut out);
        out
    }

    /// Chunk one document body, attaching `provenance` plus position metadata.
    ///
    /// Returns an empty vector for empty text: callers skip the document
    /// rather than storing a placeholder.
    pub fn chunk_document(&self, text: &str, provenance: &DocumentProvenance) -> Vec<Chunk> {
        let pieces = self.split_text(text);
        let total_chunks = pieces.len();
        pieces
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| Chunk {
                text,
                metadata: ChunkMetadata {
                    url: provenance.url.clone(),
                    title: provenance.title.clone(),
                    source: provenance.source.clone(),
                    query: provenance.query.clone(),
                    chunk_index,
                    total_chunks,
                },
            })
            .collect()
    }

    /// Chunk every document in input order, skipping those with empty content.
    pub fn chunk_many(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for doc in documents {
            if doc.content.trim().is_empty() {
                warn!(url = %doc.url, "skipping document with empty content");
                continue;
            }
            let doc_chunks = self.chunk_document(&doc.content, &doc.provenance());
            debug!(url = %doc.url, chunks = doc_chunks.len(), "chunked document");
            chunks.extend(doc_chunks);
        }
        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[&str], out: &mut Vec<String>) {
        let idx = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s))
            .unwrap_or(separators.len() - 1);
        let remaining = &separators[idx + 1..];

        let mut pending: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separators[idx]) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                self.merge_splits(&pending, out);
                pending.clear();
            }
            if remaining.is_empty() {
                push_trimmed(out, piece);
            } else {
                self.split_recursive(piece, remaining, out);
            }
        }
        if !pending.is_empty() {
            self.merge_splits(&pending, out);
        }
    }

    fn merge_splits(&self, splits: &[&str], out: &mut Vec<String>) {
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                push_trimmed(out, &join_window(&window));
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece, len));
            total += len;
        }

        if !window.is_empty() {
            push_trimmed(out, &join_window(&window));
        }
    }
}

/// Split on `separator`, keeping it attached to the end of each piece.
/// An empty separator splits between characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    text.split_inclusive(separator)
        .filter(|s| !s.is_empty())
        .collect()
}

fn join_window(window: &VecDeque<(&str, usize)>) -> String {
    window.iter().map(|(s, _)| *s).collect()
}

fn push_trimmed(out: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str, content: &str) -> Document {
        Document {
            url: url.to_string(),
            title: format!("Title of {}", url),
            content: content.to_string(),
            source: "web".to_string(),
            query: "test query".to_string(),
        }
    }

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        let chunker = Chunker::default();
        assert!(chunker.chunk_document("", &doc("u", "").provenance()).is_empty());
        assert!(chunker.chunk_document("  \n\n ", &doc("u", "").provenance()).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunker = Chunker::default();
        let chunks = chunker.chunk_document("Hello, world!", &doc("u", "").provenance());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].metadata.chunk_index, 0);
        assert_eq!(chunks[0].metadata.total_chunks, 1);
    }

    #[test]
    fn test_chunk_count_matches_window_arithmetic() {
        // Unbroken text falls through to character splitting, so the count
        // is ceil((len - overlap) / (size - overlap)).
        let cases = [
            (2500, 1000, 200, 3),
            (1000, 1000, 200, 1),
            (1001, 1000, 200, 2),
            (1800, 1000, 200, 2),
            (1801, 1000, 200, 3),
            (100, 10, 0, 10),
            (95, 10, 5, 18),
        ];
        for (len, size, overlap, expected) in cases {
            let chunker = Chunker::new(size, overlap).unwrap();
            let pieces = chunker.split_text(&"x".repeat(len));
            assert_eq!(
                pieces.len(),
                expected,
                "len={} size={} overlap={}",
                len,
                size,
                overlap
            );
            assert!(pieces.iter().all(|p| p.chars().count() <= size));
        }
    }

    #[test]
    fn test_overlap_is_carried_between_chunks() {
        let chunker = Chunker::new(1000, 200).unwrap();
        let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let pieces = chunker.split_text(&text);
        assert_eq!(pieces[0], text[0..1000]);
        assert_eq!(pieces[1], text[800..1800]);
        assert_eq!(pieces[2], text[1600..2500]);
    }

    #[test]
    fn test_chunk_count_monotonic_in_length() {
        let chunker = Chunker::new(200, 40).unwrap();
        let mut previous = 0;
        for n in (10..600).step_by(25) {
            let count = chunker.split_text(&words(n)).len();
            assert!(count >= previous, "count dropped at {} words", n);
            assert!(count >= 1);
            previous = count;
        }
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let chunker = Chunker::new(30, 0).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let pieces = chunker.split_text(text);
        assert_eq!(pieces, vec!["First paragraph here.", "Second paragraph here."]);
    }

    #[test]
    fn test_sentences_used_when_paragraph_too_long() {
        let chunker = Chunker::new(40, 0).unwrap();
        let text = "The fox ran far away. The jet flew very high. The end came.";
        let pieces = chunker.split_text(text);
        assert!(pieces.len() >= 2);
        for p in &pieces {
            assert!(p.chars().count() <= 40);
        }
        assert!(pieces[0].starts_with("The fox ran far away."));
    }

    #[test]
    fn test_disjoint_chunks_reassemble_source() {
        let chunker = Chunker::new(50, 0).unwrap();
        let text = format!("{}\n\n{}\n{}", words(30), words(12), words(40));
        let pieces = chunker.split_text(&text);
        let rebuilt: String = pieces.concat().chars().filter(|c| !c.is_whitespace()).collect();
        let original: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn test_indices_contiguous_and_metadata_copied() {
        let chunker = Chunker::new(60, 10).unwrap();
        let d = doc("https://example.com/a", &words(80));
        let chunks = chunker.chunk_document(&d.content, &d.provenance());
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.metadata.chunk_index, i);
            assert_eq!(c.metadata.total_chunks, chunks.len());
            assert_eq!(c.metadata.url, "https://example.com/a");
            assert_eq!(c.metadata.title, "Title of https://example.com/a");
            assert_eq!(c.metadata.source, "web");
            assert_eq!(c.metadata.query, "test query");
        }
    }

    #[test]
    fn test_chunk_many_skips_empty_documents() {
        let chunker = Chunker::default();
        let docs = vec![
            doc("https://a.example", "valid text about something useful"),
            doc("https://b.example", ""),
        ];
        let chunks = chunker.chunk_many(&docs);
        assert_eq!(chunks.len(), 1);
        assert!(chunks.iter().all(|c| c.metadata.url == "https://a.example"));
    }

    #[test]
    fn test_chunk_many_preserves_document_order() {
        let chunker = Chunker::new(40, 0).unwrap();
        let docs = vec![
            doc("https://first.example", &words(20)),
            doc("https://second.example", &words(20)),
        ];
        let chunks = chunker.chunk_many(&docs);
        let first_second = chunks
            .iter()
            .position(|c| c.metadata.url == "https://second.example")
            .unwrap();
        assert!(chunks[..first_second]
            .iter()
            .all(|c| c.metadata.url == "https://first.example"));
        assert!(chunks[first_second..]
            .iter()
            .all(|c| c.metadata.url == "https://second.example"));
    }

    #[test]
    fn test_multibyte_utf8_chars() {
        let chunker = Chunker::new(5, 1).unwrap();
        let text = "┌──────────────────┐\n│ Hello world      │\n└──────────────────┘";
        let pieces = chunker.split_text(text);
        assert!(!pieces.is_empty());
        for p in &pieces {
            assert!(p.chars().count() <= 5);
        }
    }

    #[test]
    fn test_deterministic() {
        let chunker = Chunker::new(30, 5).unwrap();
        let text = "Alpha beta.\n\nGamma delta epsilon.\n\nZeta eta theta iota kappa lambda.";
        assert_eq!(chunker.split_text(text), chunker.split_text(text));
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        assert!(Chunker::new(0, 0).is_err());
        assert!(Chunker::new(100, 100).is_err());
        assert!(Chunker::new(100, 150).is_err());
    }
}
