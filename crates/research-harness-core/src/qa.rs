//! Follow-up question answering over a stored research session.

use anyhow::Result;
use tracing::info;

use crate::context;
use crate::error::ResearchError;
use crate::llm::CompletionClient;
use crate::prompts;
use crate::retriever::Retriever;

/// Chunks retrieved per question.
pub const QA_TOP_K: usize = 5;

/// Answer `question` from the chunks stored under `session_id`.
///
/// An unknown or deleted session fails with
/// [`ResearchError::SessionNotFound`]; a session with no chunks fails with
/// [`ResearchError::EmptySession`] instead of producing an unsupported answer.
pub async fn answer_question(
    retriever: &Retriever,
    llm: &dyn CompletionClient,
    question: &str,
    session_id: &str,
    top_k: usize,
) -> Result<String> {
    let chunks = retriever.retrieve(question, session_id, Some(top_k)).await?;
    if chunks.is_empty() {
        return Err(ResearchError::EmptySession(session_id.to_string()).into());
    }
    info!(session_id, chunks = chunks.len(), "answering question");

    let context_block = context::assemble(&chunks);
    llm.complete(
        prompts::QA_SYSTEM_PROMPT,
        &prompts::qa_user_message(&context_block, question),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunker;
    use crate::embedding::HashEmbedder;
    use crate::error::is_session_not_found;
    use crate::models::Document;
    use crate::store::memory::InMemoryIndex;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct EchoLlm(Mutex<Option<String>>);

    #[async_trait]
    impl CompletionClient for EchoLlm {
        async fn complete(&self, system: &str, user: &str) -> Result<String> {
            assert_eq!(system, prompts::QA_SYSTEM_PROMPT);
            *self.0.lock().unwrap() = Some(user.to_string());
            Ok("answer [1]".to_string())
        }
    }

    fn retriever() -> Retriever {
        let index = Arc::new(InMemoryIndex::new(Arc::new(HashEmbedder::new(256))));
        Retriever::new(Chunker::new(200, 20).unwrap(), index, 10)
    }

    fn doc(content: &str) -> Document {
        Document {
            url: "https://a.example".to_string(),
            title: "t".to_string(),
            content: content.to_string(),
            source: "web".to_string(),
            query: "q".to_string(),
        }
    }

    #[tokio::test]
    async fn test_answer_uses_retrieved_context() {
        let r = retriever();
        r.store(
            &[
                doc("A unique sentence about foxes."),
                doc("A unique sentence about jets."),
            ],
            "S",
        )
        .await
        .unwrap();
        let llm = EchoLlm::default();
        let answer = answer_question(&r, &llm, "Tell me about foxes", "S", 1)
            .await
            .unwrap();
        assert_eq!(answer, "answer [1]");
        let prompt = llm.0.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("[1] A unique sentence about foxes."));
        assert!(!prompt.contains("jets"));
        assert!(prompt.contains("Question: Tell me about foxes"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_signalled() {
        let llm = EchoLlm::default();
        let err = answer_question(&retriever(), &llm, "anything", "missing", QA_TOP_K)
            .await
            .unwrap_err();
        assert!(is_session_not_found(&err));
        assert!(llm.0.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_session_is_signalled() {
        let r = retriever();
        r.store(&[doc("")], "S").await.unwrap();
        let err = answer_question(&r, &EchoLlm::default(), "anything", "S", QA_TOP_K)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResearchError>(),
            Some(ResearchError::EmptySession(_))
        ));
    }
}
