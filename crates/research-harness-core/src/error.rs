//! Error conditions that callers need to tell apart.
//!
//! Everything else in the crate is reported through [`anyhow::Error`]; these
//! variants travel inside it and are recovered with `downcast_ref`.

use thiserror::Error;

use crate::state::Status;

#[derive(Debug, Error)]
pub enum ResearchError {
    /// The session was never created or has been deleted.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The session exists but holds no chunks.
    #[error("session {0} has no indexed content")]
    EmptySession(String),

    /// The planning response could not be turned into a [`ResearchPlan`](crate::models::ResearchPlan).
    #[error("malformed research plan: {0}")]
    MalformedPlan(String),

    /// Every query came back empty or every fetch failed.
    #[error("no usable documents collected from {queries} search queries")]
    NoDocuments { queries: usize },

    /// The session was indexed with a different embedding model or size
    /// than the one now configured, so its vectors cannot be compared.
    #[error("session {session_id} was indexed with {stored}, but the configured embedder is {current}")]
    EmbeddingMismatch {
        session_id: String,
        stored: String,
        current: String,
    },

    /// A stage update tried to move the workflow backwards.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: Status, to: Status },
}

/// Returns true if `err` wraps [`ResearchError::SessionNotFound`].
pub fn is_session_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<ResearchError>(),
        Some(ResearchError::SessionNotFound(_))
    )
}
