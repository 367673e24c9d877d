//! OpenAI-compatible chat completion client.
//!
//! Calls `POST {llm.url}/v1/chat/completions` with a system and a user
//! message. The planner and synthesizer each get their own instance so
//! they can run at different temperatures.

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use research_harness_core::llm::CompletionClient;

use crate::config::LlmConfig;
use crate::http;

pub struct OpenAIChat {
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIChat {
    /// Build a client at `temperature`. Requires `OPENAI_API_KEY`.
    pub fn new(config: &LlmConfig, temperature: f32) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Ok(Self {
            endpoint: format!("{}/v1/chat/completions", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature,
            max_tokens: config.max_tokens,
            max_retries: config.max_retries,
            api_key,
            client: http::client(config.timeout_secs)?,
        })
    }

    pub fn planner(config: &LlmConfig) -> Result<Self> {
        Self::new(config, config.temperature_planner)
    }

    pub fn synthesizer(config: &LlmConfig) -> Result<Self> {
        Self::new(config, config.temperature_synthesizer)
    }

    fn request_body(&self, system: &str, user: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAIChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let json = http::post_json_with_retry(
            &self.client,
            "OpenAI",
            &self.endpoint,
            Some(&self.api_key),
            &self.request_body(system, user),
            self.max_retries,
        )
        .await?;
        parse_chat_response(&json)
    }
}

/// Extract `choices[0].message.content`.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| anyhow!("Invalid chat completion response: missing choices[0].message.content"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let json = serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "  hello  "}}]
        });
        assert_eq!(parse_chat_response(&json).unwrap(), "hello");
    }

    #[test]
    fn test_parse_chat_response_missing_content() {
        assert!(parse_chat_response(&serde_json::json!({"choices": []})).is_err());
        assert!(parse_chat_response(&serde_json::json!({})).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let chat = OpenAIChat {
            endpoint: "http://localhost/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 2000,
            max_retries: 0,
            api_key: "k".to_string(),
            client: reqwest::Client::new(),
        };
        let body = chat.request_body("sys", "usr");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
    }
}
