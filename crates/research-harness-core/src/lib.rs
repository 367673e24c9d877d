//! # Research Harness Core
//!
//! Runtime-agnostic logic for Research Harness: data models, chunking,
//! the retrieval index abstraction, context assembly, and the
//! Plan → Collect → Synthesize workflow with its follow-up Q&A path.
//!
//! This crate contains no tokio, sqlx, filesystem or network I/O. Network
//! collaborators (completion, search, page fetching, embeddings) are traits
//! implemented by the application crate.

pub mod chunk;
pub mod context;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod qa;
pub mod retriever;
pub mod stages;
pub mod state;
pub mod store;
pub mod tools;
pub mod workflow;
