//! `research run` and `research ask`.
//!
//! `run` drives the workflow and prints the report with its numbered
//! sources (or the JSON outcome); `ask` answers a follow-up question over
//! a stored session.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use research_harness_core::error::ResearchError;
use research_harness_core::llm::CompletionClient;
use research_harness_core::qa;
use research_harness_core::retriever::Retriever;
use research_harness_core::state::ResearchOutcome;
use research_harness_core::workflow::{ResearchWorkflow, WorkflowObserver};

use crate::config::Config;
use crate::llm::OpenAIChat;
use crate::pipeline;
use crate::progress::ProgressMode;

/// Run `workflow` for `topic` and convert the final state to an outcome.
pub async fn research(
    workflow: &ResearchWorkflow,
    topic: &str,
    observer: &dyn WorkflowObserver,
) -> Result<ResearchOutcome> {
    let state = workflow.run(topic, observer).await?;
    info!(status = %state.status, documents = state.documents.len(), "research finished");
    Ok(state.outcome())
}

/// CLI entry point for `research run`. Exits non-zero when the workflow
/// ends in `error`.
pub async fn run_research(
    config: &Config,
    topic: &str,
    json: bool,
    output: Option<&Path>,
    progress: ProgressMode,
) -> Result<()> {
    let index = pipeline::open_index(config).await?;
    let workflow = pipeline::build_workflow(config, index)?;
    let observer = progress.observer();

    let outcome = research(&workflow, topic, observer.as_ref()).await?;

    if let Some(path) = output {
        if let ResearchOutcome::Complete { .. } = outcome {
            std::fs::write(path, render_markdown(&outcome))
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.is_complete() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_outcome(outcome: &ResearchOutcome) {
    match outcome {
        ResearchOutcome::Complete {
            report,
            sources,
            session_id,
            documents_count,
            ..
        } => {
            println!("{}", report);
            println!();
            println!("--- Sources ({}) ---", sources.len());
            for (i, url) in sources.iter().enumerate() {
                println!("{}. {}", i + 1, url);
            }
            println!();
            println!("documents:  {}", documents_count);
            println!("session_id: {}", session_id);
        }
        ResearchOutcome::Failed { error, logs, .. } => {
            for line in logs {
                eprintln!("{}", line);
            }
            eprintln!("Error: {}", error);
        }
    }
}

/// Markdown export of a completed run: title, report, subtopics, sources,
/// and the session id for later questions. Empty for a failed run.
pub fn render_markdown(outcome: &ResearchOutcome) -> String {
    let ResearchOutcome::Complete {
        topic,
        report,
        sources,
        session_id,
        subtopics,
        ..
    } = outcome
    else {
        return String::new();
    };

    let mut md = format!("# {}\n\n{}\n", topic, report.trim_end());
    if !subtopics.is_empty() {
        md.push_str("\n## Subtopics\n\n");
        for (i, subtopic) in subtopics.iter().enumerate() {
            md.push_str(&format!("{}. {}\n", i + 1, subtopic));
        }
    }
    md.push_str("\n## Sources\n\n");
    for (i, url) in sources.iter().enumerate() {
        md.push_str(&format!("{}. <{}>\n", i + 1, url));
    }
    md.push_str(&format!("\n---\n\nSession: `{}`\n", session_id));
    md
}

/// Answer `question` over `session_id`, failing if the session is unknown.
pub async fn ask(
    retriever: &Retriever,
    llm: &dyn CompletionClient,
    session_id: &str,
    question: &str,
    top_k: usize,
) -> Result<String> {
    qa::answer_question(retriever, llm, question, session_id, top_k).await
}

/// CLI entry point for `research ask`.
pub async fn run_ask(config: &Config, session_id: &str, question: &str) -> Result<()> {
    let index = pipeline::open_index(config).await?;
    if !index.session_exists(session_id).await? {
        return Err(ResearchError::SessionNotFound(session_id.to_string()).into());
    }
    let retriever = pipeline::retriever(config, index)?;
    let llm = OpenAIChat::synthesizer(&config.llm)?;

    let answer = ask(
        &retriever,
        &llm,
        session_id,
        question,
        config.retrieval.qa_top_k,
    )
    .await?;
    println!("{}", answer);
    Ok(())
}
