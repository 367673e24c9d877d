//! Tavily web search client.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tracing::debug;

use research_harness_core::models::SearchHit;
use research_harness_core::tools::SearchProvider;

use crate::config::SearchConfig;
use crate::http;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Searches the web through `POST https://api.tavily.com/search`.
///
/// Requires `TAVILY_API_KEY`.
pub struct TavilySearch {
    api_key: String,
    client: reqwest::Client,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| anyhow!("TAVILY_API_KEY environment variable not set"))?;
        Ok(Self {
            api_key,
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": max_results,
            "search_depth": "basic",
        });
        // Single attempt; the collect stage skips queries that fail.
        let json = http::post_json_with_retry(
            &self.client,
            "Tavily",
            TAVILY_SEARCH_URL,
            Some(&self.api_key),
            &body,
            0,
        )
        .await?;
        let hits = parse_results(&json);
        debug!(query, hits = hits.len(), "search complete");
        Ok(hits)
    }
}

/// Map Tavily's `results[]` into hits. A missing `results` key means no hits.
fn parse_results(json: &serde_json::Value) -> Vec<SearchHit> {
    json.get("results")
        .and_then(|r| r.as_array())
        .map(|results| {
            results
                .iter()
                .filter_map(|r| {
                    let url = r.get("url")?.as_str()?.to_string();
                    Some(SearchHit {
                        url,
                        title: str_field(r, "title"),
                        content_snippet: str_field(r, "content"),
                        score: r.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}
