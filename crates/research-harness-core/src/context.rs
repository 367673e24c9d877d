//! Citation-ready context assembly.
//!
//! Two independent numbering schemes come out of a research run:
//!
//! - **Context citations**: the `i`-th retrieved chunk (1-based, retrieval
//!   rank order) is rendered as `[i]`. Report text cites these.
//! - **Sources list**: unique document URLs, first occurrence wins, in
//!   document insertion order.
//!
//! They are not required to line up: `[2]` in a report refers to the second
//! retrieved chunk, not the second source URL.

use std::collections::HashSet;

use crate::models::Document;

/// Render retrieved chunks as `"[i] <text>"` blocks separated by blank lines.
///
/// ```rust
/// use research_harness_core::context::assemble;
///
/// let ctx = assemble(&["alpha".to_string(), "beta".to_string()]);
/// assert_eq!(ctx, "[1] alpha\n\n[2] beta");
/// ```
pub fn assemble(chunks: &[String]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[{}] {}", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Document URLs deduplicated in first-seen order.
pub fn unique_sources(documents: &[Document]) -> Vec<String> {
    let mut seen = HashSet::new();
    documents
        .iter()
        .filter(|d| seen.insert(d.url.as_str()))
        .map(|d| d.url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str) -> Document {
        Document {
            url: url.to_string(),
            title: String::new(),
            content: "body".to_string(),
            source: "web".to_string(),
            query: "q".to_string(),
        }
    }

    #[test]
    fn test_citation_markers_follow_retrieval_order() {
        let chunks = vec![
            "zebra facts".to_string(),
            "apple facts".to_string(),
            "mango facts".to_string(),
        ];
        let ctx = assemble(&chunks);
        let blocks: Vec<&str> = ctx.split("\n\n").collect();
        assert_eq!(blocks, vec!["[1] zebra facts", "[2] apple facts", "[3] mango facts"]);
        assert!(!ctx.contains("[4]"));
    }

    #[test]
    fn test_assemble_empty() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn test_unique_sources_first_seen_order() {
        let docs = vec![
            doc("https://b.example"),
            doc("https://a.example"),
            doc("https://b.example"),
            doc("https://c.example"),
            doc("https://a.example"),
        ];
        assert_eq!(
            unique_sources(&docs),
            vec!["https://b.example", "https://a.example", "https://c.example"]
        );
    }
}
