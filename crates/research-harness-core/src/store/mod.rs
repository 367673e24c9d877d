//! Retrieval index abstraction.
//!
//! The [`RetrievalIndex`] trait is the per-session vector collection the
//! retriever writes chunks into and queries for context. Backends own
//! embedding generation: callers pass text in and get ranked text out.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Contract
//!
//! | Method | Behaviour |
//! |--------|-----------|
//! | [`create_collection`](RetrievalIndex::create_collection) | Idempotent; an existing collection is reused untouched |
//! | [`add`](RetrievalIndex::add) | Appends; ids are `"{session_id}:{ordinal}"` continuing from prior adds |
//! | [`query`](RetrievalIndex::query) | Up to `top_k` texts, most similar first, ties by ordinal |
//! | [`delete_collection`](RetrievalIndex::delete_collection) | Drops every chunk of the session |
//!
//! `query` against a session that was never created, or has been deleted,
//! fails with [`ResearchError::SessionNotFound`](crate::error::ResearchError::SessionNotFound).
//! An existing session with no chunks yields an empty result.
//!
//! Repeated `add` calls with identical chunks store duplicates. Every stored
//! chunk keeps a SHA-256 content hash so duplicates stay detectable.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::models::Chunk;

/// A chunk that matched a query, with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// `"{session_id}:{ordinal}"`.
    pub id: String,
    pub ordinal: i64,
    pub text: String,
    pub score: f32,
}

/// Per-session vector collection.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Create the collection for `session_id`, or reuse it if it exists.
    async fn create_collection(&self, session_id: &str) -> Result<()>;

    /// Embed and append chunks to the session's collection, creating it if needed.
    async fn add(&self, session_id: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return up to `top_k` chunk texts ranked by similarity to `query_text`.
    async fn query(&self, session_id: &str, query_text: &str, top_k: usize) -> Result<Vec<String>>;

    /// Remove the collection and every chunk in it. Unknown sessions are a no-op.
    async fn delete_collection(&self, session_id: &str) -> Result<()>;
}

/// Build the index-wide chunk id for an ordinal within a session.
pub fn chunk_id(session_id: &str, ordinal: i64) -> String {
    format!("{}:{}", session_id, ordinal)
}

/// SHA-256 hex digest of a chunk's text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sort by score descending, then ordinal ascending, and keep `top_k`.
///
/// The ordinal tie-break keeps citation numbering reproducible across
/// repeated retrievals of the same query.
pub fn rank(mut scored: Vec<ScoredChunk>, top_k: usize) -> Vec<ScoredChunk> {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.ordinal.cmp(&b.ordinal))
    });
    scored.truncate(top_k);
    scored
}
