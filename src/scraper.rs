//! HTTP page fetcher.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use research_harness_core::tools::PageFetcher;

use crate::config::ScraperConfig;
use crate::extract;

/// Fetches a URL and extracts its body text.
///
/// Every ordinary failure (network error, timeout, non-2xx status,
/// unsupported content type, nothing left after extraction) yields `None`.
pub struct WebFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl WebFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_chars: config.max_chars,
        })
    }
}

#[async_trait]
impl PageFetcher for WebFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "fetch failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "fetch returned non-success status");
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(extract::MIME_HTML)
            .to_string();

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(url, error = %e, "reading response body failed");
                return None;
            }
        };

        match extract::extract_text(&bytes, &content_type) {
            Ok(text) => {
                let text = extract::truncate_chars(text.trim(), self.max_chars).to_string();
                if text.is_empty() {
                    debug!(url, "no text extracted");
                    return None;
                }
                debug!(url, chars = text.chars().count(), "page extracted");
                Some(text)
            }
            Err(e) => {
                debug!(url, error = %e, "extraction failed");
                None
            }
        }
    }
}
