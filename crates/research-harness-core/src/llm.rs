//! Text-completion collaborator and structured plan parsing.
//!
//! The core only needs `(system, user) -> text`. The planning call is the
//! same call with a JSON-only instruction, followed by strict parsing into
//! a [`ResearchPlan`].

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::error::ResearchError;
use crate::models::ResearchPlan;
use crate::prompts;

/// A chat-style completion backend.
///
/// Implementations enforce their own request timeout and surface it as an
/// error.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Ask `llm` for a research plan for `topic`.
///
/// Fails with [`ResearchError::MalformedPlan`] when the response is not a
/// JSON object with non-empty string-array `subtopics` and `search_queries`.
pub async fn create_plan(llm: &dyn CompletionClient, topic: &str) -> Result<ResearchPlan> {
    let system = format!(
        "{}\n\n{}",
        prompts::PLANNER_SYSTEM_PROMPT,
        prompts::JSON_ONLY_INSTRUCTION
    );
    let raw = llm
        .complete(&system, &prompts::planner_user_message(topic))
        .await?;
    Ok(parse_plan(&raw)?)
}

/// Parse a planning response, tolerating a surrounding markdown code fence.
pub fn parse_plan(raw: &str) -> Result<ResearchPlan, ResearchError> {
    let json: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| ResearchError::MalformedPlan(format!("response is not valid JSON: {}", e)))?;
    Ok(ResearchPlan {
        subtopics: string_array(&json, "subtopics")?,
        search_queries: string_array(&json, "search_queries")?,
    })
}

fn string_array(json: &Value, key: &str) -> Result<Vec<String>, ResearchError> {
    let items = json
        .get(key)
        .ok_or_else(|| ResearchError::MalformedPlan(format!("missing required key '{}'", key)))?
        .as_array()
        .ok_or_else(|| ResearchError::MalformedPlan(format!("'{}' is not an array", key)))?;
    let values: Vec<String> = items
        .iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| ResearchError::MalformedPlan(format!("'{}' must contain only strings", key)))
        })
        .filter(|r| !matches!(r, Ok(s) if s.is_empty()))
        .collect::<Result<_, _>>()?;
    if values.is_empty() {
        return Err(ResearchError::MalformedPlan(format!("'{}' is empty", key)));
    }
    Ok(values)
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedLlm(String);

    #[async_trait]
    impl CompletionClient for CannedLlm {
        async fn complete(&self, system: &str, _user: &str) -> Result<String> {
            assert!(system.contains("JSON"));
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_parse_valid_plan() {
        let plan = parse_plan(
            r#"{"subtopics": ["a", "b", "c"], "search_queries": ["q1", "q2", "q3", "q4", "q5"]}"#,
        )
        .unwrap();
        assert_eq!(plan.subtopics, vec!["a", "b", "c"]);
        assert_eq!(plan.search_queries.len(), 5);
    }

    #[test]
    fn test_parse_fenced_plan() {
        let raw = "```json\n{\"subtopics\": [\"a\"], \"search_queries\": [\"q\"]}\n```";
        let plan = parse_plan(raw).unwrap();
        assert_eq!(plan.search_queries, vec!["q"]);
    }

    #[test]
    fn test_missing_search_queries_is_malformed() {
        let err = parse_plan(r#"{"subtopics": ["a"]}"#).unwrap_err();
        match err {
            ResearchError::MalformedPlan(msg) => assert!(msg.contains("search_queries")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_non_string_entries_are_malformed() {
        assert!(parse_plan(r#"{"subtopics": [1], "search_queries": ["q"]}"#).is_err());
        assert!(parse_plan(r#"{"subtopics": "a", "search_queries": ["q"]}"#).is_err());
        assert!(parse_plan("not json at all").is_err());
    }

    #[test]
    fn test_blank_entries_dropped() {
        let plan = parse_plan(r#"{"subtopics": ["a", "  "], "search_queries": ["q", ""]}"#).unwrap();
        assert_eq!(plan.subtopics, vec!["a"]);
        assert_eq!(plan.search_queries, vec!["q"]);
    }

    #[test]
    fn test_empty_or_blank_lists_are_malformed() {
        for raw in [
            r#"{"subtopics": ["a"], "search_queries": []}"#,
            r#"{"subtopics": ["a"], "search_queries": ["", "  "]}"#,
        ] {
            match parse_plan(raw).unwrap_err() {
                ResearchError::MalformedPlan(msg) => assert_eq!(msg, "'search_queries' is empty"),
                other => panic!("unexpected error: {:?}", other),
            }
        }
        match parse_plan(r#"{"subtopics": [" "], "search_queries": ["q"]}"#).unwrap_err() {
            ResearchError::MalformedPlan(msg) => assert_eq!(msg, "'subtopics' is empty"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_plan_wraps_malformed_error() {
        let llm = CannedLlm("{}".to_string());
        let err = create_plan(&llm, "topic").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResearchError>(),
            Some(ResearchError::MalformedPlan(_))
        ));
    }
}
