//! Core data models that flow through the research pipeline.
//!
//! These types are shared by the chunker, the retrieval index, the stage
//! functions, and every collaborator implementation.

use serde::{Deserialize, Serialize};

/// One fetched and extracted web page.
///
/// Produced by the collect stage and never mutated afterwards. An empty
/// `content` marks a document that must be excluded from chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Where the document came from (e.g. `"web"`).
    pub source: String,
    /// The search query that surfaced this document.
    pub query: String,
}

impl Document {
    /// Provenance for chunks cut from this document: every field except `content`.
    pub fn provenance(&self) -> DocumentProvenance {
        DocumentProvenance {
            url: self.url.clone(),
            title: self.title.clone(),
            source: self.source.clone(),
            query: self.query.clone(),
        }
    }
}

/// Document fields carried into chunk metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProvenance {
    pub url: String,
    pub title: String,
    pub source: String,
    pub query: String,
}

/// Metadata attached to every chunk.
///
/// Chunks of one document are numbered `0..total_chunks` without gaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub url: String,
    pub title: String,
    pub source: String,
    pub query: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A bounded-size text segment, the unit stored in the retrieval index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A single hit returned by the web search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    /// Short excerpt supplied by the search provider.
    pub content_snippet: String,
    pub score: f64,
}

/// Output of the planning call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPlan {
    pub subtopics: Vec<String>,
    pub search_queries: Vec<String>,
}
