//! Chunker + retrieval index composition.
//!
//! [`Retriever::store`] runs chunk → create collection → add. A failure in
//! `add` leaves whatever was already written; there is no rollback.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::chunk::Chunker;
use crate::models::Document;
use crate::store::RetrievalIndex;

/// Default number of chunks returned by [`Retriever::retrieve`].
pub const DEFAULT_TOP_K: usize = 10;

/// Stores documents into, and retrieves chunks from, a session's collection.
#[derive(Clone)]
pub struct Retriever {
    chunker: Chunker,
    index: Arc<dyn RetrievalIndex>,
    default_top_k: usize,
}

impl Retriever {
    pub fn new(chunker: Chunker, index: Arc<dyn RetrievalIndex>, default_top_k: usize) -> Self {
        Self {
            chunker,
            index,
            default_top_k,
        }
    }

    /// Chunk `documents` and persist them under `session_id`.
    ///
    /// Returns the number of chunks written.
    pub async fn store(&self, documents: &[Document], session_id: &str) -> Result<usize> {
        let chunks = self.chunker.chunk_many(documents);
        self.index
            .create_collection(session_id)
            .await
            .with_context(|| format!("Failed to create collection for session {}", session_id))?;
        self.index
            .add(session_id, &chunks)
            .await
            .with_context(|| format!("Failed to add chunks to session {}", session_id))?;
        info!(
            session_id,
            documents = documents.len(),
            chunks = chunks.len(),
            "stored documents"
        );
        Ok(chunks.len())
    }

    /// Retrieve the chunk texts most similar to `query`, best first.
    pub async fn retrieve(
        &self,
        query: &str,
        session_id: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<String>> {
        let k = top_k.unwrap_or(self.default_top_k);
        self.index.query(session_id, query, k).await
    }

    /// Release the session's collection.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        self.index.delete_collection(session_id).await
    }
}
