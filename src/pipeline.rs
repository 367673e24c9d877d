//! Wiring from [`Config`] to the core workflow.
//!
//! Builds the SQLite-backed index, the retriever over it, and the three
//! stages with their network collaborators. The `*_with` variants accept
//! any collaborator implementation so tests can run the full pipeline
//! offline.

use anyhow::Result;
use std::sync::Arc;

use research_harness_core::chunk::Chunker;
use research_harness_core::llm::CompletionClient;
use research_harness_core::retriever::Retriever;
use research_harness_core::stages::{CollectSettings, CollectStage, PlanStage, SynthesizeStage};
use research_harness_core::tools::{PageFetcher, SearchProvider};
use research_harness_core::workflow::ResearchWorkflow;

use crate::config::Config;
use crate::db;
use crate::embedding::create_provider;
use crate::llm::OpenAIChat;
use crate::scraper::WebFetcher;
use crate::sqlite_store::SqliteIndex;
use crate::websearch::TavilySearch;

/// Open the database and the session index with the configured embedder.
pub async fn open_index(config: &Config) -> Result<Arc<SqliteIndex>> {
    let pool = db::connect(config).await?;
    let embedder = create_provider(&config.embedding)?;
    Ok(Arc::new(SqliteIndex::open(pool, embedder).await?))
}

pub fn retriever(config: &Config, index: Arc<SqliteIndex>) -> Result<Retriever> {
    let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    Ok(Retriever::new(chunker, index, config.retrieval.top_k))
}

/// The production workflow: OpenAI-compatible chat, Tavily search, HTTP fetcher.
pub fn build_workflow(config: &Config, index: Arc<SqliteIndex>) -> Result<ResearchWorkflow> {
    build_workflow_with(
        config,
        index,
        Arc::new(OpenAIChat::planner(&config.llm)?),
        Arc::new(OpenAIChat::synthesizer(&config.llm)?),
        Arc::new(TavilySearch::new(&config.search)?),
        Arc::new(WebFetcher::new(&config.scraper)?),
    )
}

pub fn build_workflow_with(
    config: &Config,
    index: Arc<SqliteIndex>,
    planner: Arc<dyn CompletionClient>,
    synthesizer: Arc<dyn CompletionClient>,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<ResearchWorkflow> {
    let settings = CollectSettings {
        max_results: config.search.max_results,
        max_sources_per_query: config.search.max_sources_per_query,
        concurrency: config.search.concurrency,
    };
    Ok(ResearchWorkflow::new(
        PlanStage::new(planner),
        CollectStage::new(search, fetcher, settings),
        SynthesizeStage::new(retriever(config, index)?, synthesizer, config.retrieval.top_k),
    ))
}
