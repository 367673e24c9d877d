//! SQLite-backed [`RetrievalIndex`].
//!
//! Sessions and their chunks persist across process runs so a report's
//! session can be questioned later with `research ask`. Vectors are stored
//! as little-endian `f32` BLOBs; queries load the session's vectors and
//! rank them by cosine similarity in process.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use tracing::debug;

use research_harness_core::embedding::{
    blob_to_vec, cosine_similarity, embed_query, vec_to_blob, EmbeddingProvider,
};
use research_harness_core::error::ResearchError;
use research_harness_core::models::Chunk;
use research_harness_core::store::{chunk_id, content_hash, rank, RetrievalIndex, ScoredChunk};

use crate::migrate;

/// A stored session as listed by `research sessions`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    /// Unix timestamp (seconds).
    pub created_at: i64,
    pub chunk_count: i64,
}

pub struct SqliteIndex {
    pool: SqlitePool,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SqliteIndex {
    /// Wrap `pool`, creating the schema if needed.
    pub async fn open(pool: SqlitePool, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool, embedder })
    }

    pub async fn session_exists(&self, session_id: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM sessions WHERE id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// All sessions, newest first.
    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.created_at, COUNT(c.id) AS chunk_count
            FROM sessions s
            LEFT JOIN session_chunks c ON c.session_id = s.id
            GROUP BY s.id
            ORDER BY s.created_at DESC, s.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SessionInfo {
                id: row.get("id"),
                created_at: row.get("created_at"),
                chunk_count: row.get("chunk_count"),
            })
            .collect())
    }

    /// Content hashes of the session's chunks, in ordinal order.
    pub async fn chunk_hashes(&self, session_id: &str) -> Result<Vec<String>> {
        let hashes: Vec<String> = sqlx::query_scalar(
            "SELECT hash FROM session_chunks WHERE session_id = ? ORDER BY ordinal ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(hashes)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// `"{model}/{dims}"` of the configured embedder.
    fn embedder_label(&self) -> String {
        format!("{}/{}", self.embedder.model_name(), self.embedder.dims())
    }

    /// Fail if any chunk of the session was embedded by another model or
    /// at another dimensionality than the configured embedder.
    async fn check_embedder(&self, session_id: &str) -> Result<()> {
        let stored: Vec<(String, i64)> = sqlx::query_as(
            "SELECT DISTINCT model, dims FROM session_chunks WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let model = self.embedder.model_name();
        let dims = self.embedder.dims() as i64;
        match stored.into_iter().find(|(m, d)| m != model || *d != dims) {
            Some((m, d)) => Err(ResearchError::EmbeddingMismatch {
                session_id: session_id.to_string(),
                stored: format!("{}/{}", m, d),
                current: self.embedder_label(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RetrievalIndex for SqliteIndex {
    async fn create_collection(&self, session_id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO sessions (id, created_at) VALUES (?, ?)")
            .bind(session_id)
            .bind(chrono::Utc::now().timestamp())
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to create session {}", session_id))?;
        Ok(())
    }

    async fn add(&self, session_id: &str, chunks: &[Chunk]) -> Result<()> {
        self.create_collection(session_id).await?;
        if chunks.is_empty() {
            return Ok(());
        }
        self.check_embedder(session_id).await?;

        let model = self.embedder.model_name().to_string();
        let dims = self.embedder.dims() as i64;
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            anyhow::bail!(
                "embedding provider returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            );
        }

        let mut tx = self.pool.begin().await?;
        let next: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(ordinal) + 1, 0) FROM session_chunks WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await?;

        for (i, (chunk, vector)) in chunks.iter().zip(vectors.iter()).enumerate() {
            let ordinal = next + i as i64;
            let metadata_json = serde_json::to_string(&chunk.metadata)?;
            sqlx::query(
                r#"
                INSERT INTO session_chunks
                    (id, session_id, ordinal, text, metadata_json, hash, embedding, model, dims)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(chunk_id(session_id, ordinal))
            .bind(session_id)
            .bind(ordinal)
            .bind(&chunk.text)
            .bind(&metadata_json)
            .bind(content_hash(&chunk.text))
            .bind(vec_to_blob(vector))
            .bind(&model)
            .bind(dims)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(session_id, added = chunks.len(), first_ordinal = next, "chunks stored");
        Ok(())
    }

    async fn query(&self, session_id: &str, query_text: &str, top_k: usize) -> Result<Vec<String>> {
        if !self.session_exists(session_id).await? {
            return Err(ResearchError::SessionNotFound(session_id.to_string()).into());
        }
        self.check_embedder(session_id).await?;

        let rows = sqlx::query(
            "SELECT ordinal, text, embedding FROM session_chunks WHERE session_id = ? ORDER BY ordinal ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = embed_query(self.embedder.as_ref(), query_text).await?;
        let scored: Vec<ScoredChunk> = rows
            .iter()
            .map(|row| {
                let ordinal: i64 = row.get("ordinal");
                let blob: Vec<u8> = row.get("embedding");
                ScoredChunk {
                    id: chunk_id(session_id, ordinal),
                    ordinal,
                    text: row.get("text"),
                    score: cosine_similarity(&query_vec, &blob_to_vec(&blob)),
                }
            })
            .collect();

        let ranked = rank(scored, top_k);
        debug!(
            session_id,
            embedder = %self.embedder_label(),
            hits = ?ranked.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            "query ranked"
        );
        Ok(ranked.into_iter().map(|c| c.text).collect())
    }

    async fn delete_collection(&self, session_id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM session_chunks WHERE session_id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
