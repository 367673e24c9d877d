//! In-memory [`RetrievalIndex`] for tests and embedded use.
//!
//! Collections live in a `HashMap` behind `std::sync::RwLock`. Query is
//! brute-force cosine similarity over every vector in the session.
//! Embedding happens before any lock is taken.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::embedding::{cosine_similarity, embed_query, EmbeddingProvider};
use crate::error::ResearchError;
use crate::models::Chunk;

use super::{chunk_id, content_hash, rank, RetrievalIndex, ScoredChunk};

struct StoredChunk {
    ordinal: i64,
    text: String,
    hash: String,
    vector: Vec<f32>,
}

/// In-memory retrieval index.
pub struct InMemoryIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    collections: RwLock<HashMap<String, Vec<StoredChunk>>>,
}

impl InMemoryIndex {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of live collections.
    pub fn collection_count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// Number of chunks stored under `session_id`, or `None` if it does not exist.
    pub fn chunk_count(&self, session_id: &str) -> Result<Option<usize>> {
        Ok(self.read()?.get(session_id).map(|c| c.len()))
    }

    /// Content hashes of a session's chunks in insertion order.
    pub fn chunk_hashes(&self, session_id: &str) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .get(session_id)
            .map(|c| c.iter().map(|sc| sc.hash.clone()).collect())
            .unwrap_or_default())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<StoredChunk>>>> {
        self.collections
            .read()
            .map_err(|_| anyhow!("retrieval index lock poisoned"))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<StoredChunk>>>> {
        self.collections
            .write()
            .map_err(|_| anyhow!("retrieval index lock poisoned"))
    }
}

#[async_trait]
impl RetrievalIndex for InMemoryIndex {
    async fn create_collection(&self, session_id: &str) -> Result<()> {
        self.write()?.entry(session_id.to_string()).or_default();
        Ok(())
    }

    async fn add(&self, session_id: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return self.create_collection(session_id).await;
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            anyhow::bail!(
                "embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }

        let mut collections = self.write()?;
        let stored = collections.entry(session_id.to_string()).or_default();
        let start = stored.len() as i64;
        for (i, (chunk, vector)) in chunks.iter().zip(vectors).enumerate() {
            stored.push(StoredChunk {
                ordinal: start + i as i64,
                text: chunk.text.clone(),
                hash: content_hash(&chunk.text),
                vector,
            });
        }
        debug!(session_id, added = chunks.len(), total = stored.len(), "chunks added");
        Ok(())
    }

    async fn query(&self, session_id: &str, query_text: &str, top_k: usize) -> Result<Vec<String>> {
        if self.read()?.get(session_id).is_none() {
            return Err(ResearchError::SessionNotFound(session_id.to_string()).into());
        }
        let query_vec = embed_query(self.embedder.as_ref(), query_text).await?;

        let collections = self.read()?;
        let stored = collections
            .get(session_id)
            .ok_or_else(|| ResearchError::SessionNotFound(session_id.to_string()))?;
        let scored: Vec<ScoredChunk> = stored
            .iter()
            .map(|sc| ScoredChunk {
                id: chunk_id(session_id, sc.ordinal),
                ordinal: sc.ordinal,
                text: sc.text.clone(),
                score: cosine_similarity(&query_vec, &sc.vector),
            })
            .collect();
        let ranked = rank(scored, top_k);
        debug!(
            session_id,
            hits = ?ranked.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "query ranked"
        );
        Ok(ranked.into_iter().map(|c| c.text).collect())
    }

    async fn delete_collection(&self, session_id: &str) -> Result<()> {
        self.write()?.remove(session_id);
        Ok(())
    }
}
