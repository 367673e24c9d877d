//! Web search and page-fetch collaborators used by the collect stage.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::SearchHit;

/// Web search backend.
///
/// "No results" is an empty vector, never an error. Transport failures are
/// errors and are recovered per query by the caller.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>>;
}

/// Page fetcher and body-text extractor.
///
/// Returns `None` when the page cannot be fetched or yields no text;
/// ordinary HTTP failures must not surface as errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}
