//! # Research Harness
//!
//! An autonomous research pipeline: give it a topic and it plans
//! sub-questions, searches and scrapes the web, indexes what it found in a
//! per-session vector collection, and writes a cited report. The session
//! stays queryable for follow-up questions.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────┐   ┌─────────┐   ┌────────────┐   ┌──────────┐
//! │  Plan  │──▶│ Collect │──▶│ Synthesize │──▶│  Report  │
//! │  (LLM) │   │ Tavily+ │   │ chunk+embed│   │ + sources│
//! └────────┘   │ scraper │   │ retrieve   │   └──────────┘
//!              └─────────┘   └─────┬──────┘
//!                                  ▼
//!                           ┌────────────┐      ┌──────────┐
//!                           │  SQLite    │◀─────│   ask    │
//!                           │  sessions  │      │  (Q&A)   │
//!                           └────────────┘      └──────────┘
//! ```
//!
//! The state machine, chunker, retriever and prompts live in
//! [`research_harness_core`]; this crate supplies the native pieces.
//!
//! ## Quick Start
//!
//! ```bash
//! research init
//! research run "Impact of AI on education" --output report.md
//! research ask <session-id> "What are the main risks?"
//! research sessions
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | Persistent session index |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | Chat completion client |
//! | [`websearch`] | Tavily search client |
//! | [`scraper`] | Page fetcher |
//! | [`extract`] | HTML / PDF / text extraction |
//! | [`pipeline`] | Config → workflow wiring |
//! | [`research`] | `run` and `ask` commands |
//! | [`sessions`] | `sessions` and `delete` commands |
//! | [`http`] | JSON POST with retry and backoff |
//! | [`progress`] | Stage progress on stderr |
//! | [`logging`] | `tracing` subscriber setup |

pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod http;
pub mod llm;
pub mod logging;
pub mod migrate;
pub mod pipeline;
pub mod progress;
pub mod research;
pub mod scraper;
pub mod sessions;
pub mod sqlite_store;
pub mod websearch;
