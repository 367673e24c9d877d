//! The three pipeline stages: Plan, Collect, Synthesize.
//!
//! Each stage reads the current [`WorkflowState`] and returns a
//! [`StageUpdate`]. Stages never return errors: a collaborator failure
//! becomes the error-shaped update (`status = error`, `error`, one log line)
//! and the runner halts.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context;
use crate::error::ResearchError;
use crate::llm::{self, CompletionClient};
use crate::models::Document;
use crate::prompts;
use crate::retriever::Retriever;
use crate::state::{PartialState, StageUpdate, Status, WorkflowState};
use crate::tools::{PageFetcher, SearchProvider};

/// A single state-transition step of the workflow.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Short identifier used in progress events (`plan`, `collect`, `synthesize`).
    fn name(&self) -> &'static str;

    async fn run(&self, state: &WorkflowState) -> StageUpdate;
}

fn failure(label: &str, prefix: &str, err: &anyhow::Error) -> StageUpdate {
    warn!(stage = label, error = %format!("{:#}", err), "stage failed");
    StageUpdate::failed(
        format!("{}: {:#}", prefix, err),
        format!("✗ {}: Error - {:#}", label, err),
    )
}

// ============ Plan ============

/// Turns the topic into subtopics and search queries.
pub struct PlanStage {
    llm: Arc<dyn CompletionClient>,
}

impl PlanStage {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Stage for PlanStage {
    fn name(&self) -> &'static str {
        "plan"
    }

    async fn run(&self, state: &WorkflowState) -> StageUpdate {
        info!(topic = %state.topic, "planning research");
        let plan = match llm::create_plan(self.llm.as_ref(), &state.topic).await {
            Ok(plan) => plan,
            Err(e) => return failure("Planner", "Planning failed", &e),
        };

        let logs = vec![
            format!("✓ Planner: Identified {} key subtopics", plan.subtopics.len()),
            format!(
                "✓ Planner: Generated {} targeted search queries",
                plan.search_queries.len()
            ),
        ];
        StageUpdate::new(
            PartialState {
                subtopics: Some(plan.subtopics),
                search_queries: Some(plan.search_queries),
                ..PartialState::default()
            },
            Status::PlanningComplete,
            logs,
        )
    }
}

// ============ Collect ============

/// Limits applied by [`CollectStage`].
#[derive(Debug, Clone, Copy)]
pub struct CollectSettings {
    /// Results requested from the search provider per query.
    pub max_results: usize,
    /// Results actually fetched per query.
    pub max_sources_per_query: usize,
    /// Queries in flight at once.
    pub concurrency: usize,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            max_results: 3,
            max_sources_per_query: 3,
            concurrency: 4,
        }
    }
}

/// Searches every planned query and fetches the result pages.
///
/// Queries run concurrently up to `concurrency`; their documents are merged
/// in the original query order. A failed search or fetch is logged and
/// skipped. Zero documents overall is a stage failure.
pub struct CollectStage {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    settings: CollectSettings,
}

impl CollectStage {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        settings: CollectSettings,
    ) -> Self {
        Self {
            search,
            fetcher,
            settings,
        }
    }

    async fn collect_query(&self, query: &str) -> Vec<Document> {
        let hits = match self.search.search(query, self.settings.max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(query, error = %format!("{:#}", e), "search failed, skipping query");
                return Vec::new();
            }
        };

        let mut documents = Vec::new();
        for hit in hits.into_iter().take(self.settings.max_sources_per_query) {
            if hit.url.trim().is_empty() {
                continue;
            }
            match self.fetcher.fetch(&hit.url).await {
                Some(content) if !content.trim().is_empty() => documents.push(Document {
                    url: hit.url,
                    title: hit.title,
                    content,
                    source: "web".to_string(),
                    query: query.to_string(),
                }),
                _ => debug!(url = %hit.url, "no content extracted"),
            }
        }
        documents
    }

    async fn collect(&self, queries: &[String]) -> Result<Vec<Document>> {
        let per_query: Vec<Vec<Document>> = stream::iter(queries.iter().cloned())
            .map(|q| async move { self.collect_query(&q).await })
            .buffered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let documents: Vec<Document> = per_query.into_iter().flatten().collect();
        if documents.is_empty() {
            return Err(ResearchError::NoDocuments {
                queries: queries.len(),
            }
            .into());
        }
        Ok(documents)
    }
}

#[async_trait]
impl Stage for CollectStage {
    fn name(&self) -> &'static str {
        "collect"
    }

    async fn run(&self, state: &WorkflowState) -> StageUpdate {
        let queries = &state.search_queries;
        info!(queries = queries.len(), "collecting documents");
        let documents = match self.collect(queries).await {
            Ok(docs) => docs,
            Err(e) => return failure("Collector", "Research execution failed", &e),
        };

        let logs = vec![
            format!("✓ Collector: Executed {} search queries", queries.len()),
            format!("✓ Collector: Collected {} documents", documents.len()),
        ];
        StageUpdate::new(
            PartialState {
                documents,
                ..PartialState::default()
            },
            Status::ResearchComplete,
            logs,
        )
    }
}

// ============ Synthesize ============

/// Indexes the collected documents and writes the cited report.
pub struct SynthesizeStage {
    retriever: Retriever,
    llm: Arc<dyn CompletionClient>,
    top_k: usize,
}

impl SynthesizeStage {
    pub fn new(retriever: Retriever, llm: Arc<dyn CompletionClient>, top_k: usize) -> Self {
        Self {
            retriever,
            llm,
            top_k,
        }
    }

    async fn synthesize(&self, topic: &str, documents: &[Document], session_id: &str) -> Result<String> {
        self.retriever.store(documents, session_id).await?;
        let chunks = self
            .retriever
            .retrieve(topic, session_id, Some(self.top_k))
            .await?;
        let context_block = context::assemble(&chunks);
        debug!(session_id, chunks = chunks.len(), "assembled report context");
        self.llm
            .complete(
                prompts::SYNTHESIZER_SYSTEM_PROMPT,
                &prompts::synthesizer_user_message(topic, &context_block),
            )
            .await
    }
}

#[async_trait]
impl Stage for SynthesizeStage {
    fn name(&self) -> &'static str {
        "synthesize"
    }

    async fn run(&self, state: &WorkflowState) -> StageUpdate {
        let session_id = if state.session_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            state.session_id.clone()
        };
        info!(
            session_id = %session_id,
            documents = state.documents.len(),
            "synthesizing report"
        );

        let report = match self
            .synthesize(&state.topic, &state.documents, &session_id)
            .await
        {
            Ok(report) => report,
            Err(e) => return failure("Synthesizer", "Synthesis failed", &e),
        };
        let sources = context::unique_sources(&state.documents);

        let logs = vec![
            format!(
                "✓ Synthesizer: Processed {} documents",
                state.documents.len()
            ),
            "✓ Synthesizer: Generated comprehensive report".to_string(),
            format!("✓ Synthesizer: Cited {} sources", sources.len()),
        ];
        StageUpdate::new(
            PartialState {
                session_id: Some(session_id),
                report: Some(report),
                sources: Some(sources),
                ..PartialState::default()
            },
            Status::Complete,
            logs,
        )
    }
}
