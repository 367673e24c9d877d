//! Workflow state and its reducer.
//!
//! Every stage returns a [`StageUpdate`]; the runner folds it into the
//! single [`WorkflowState`] with [`WorkflowState::merge`]. Fields follow one
//! of two policies:
//!
//! | Policy | Fields |
//! |--------|--------|
//! | overwrite (last writer wins) | `subtopics`, `search_queries`, `session_id`, `report`, `sources`, `status`, `error` |
//! | append (concatenate, never dedupe or reorder) | `documents`, `logs` |
//!
//! `topic` is set once at construction. Append fields never shrink.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ResearchError;
use crate::models::Document;

/// Pipeline status. Forward-only, with an absorbing `Error` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Initialized,
    PlanningComplete,
    ResearchComplete,
    Complete,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Initialized => "initialized",
            Status::PlanningComplete => "planning_complete",
            Status::ResearchComplete => "research_complete",
            Status::Complete => "complete",
            Status::Error => "error",
        }
    }

    fn rank(&self) -> Option<u8> {
        match self {
            Status::Initialized => Some(0),
            Status::PlanningComplete => Some(1),
            Status::ResearchComplete => Some(2),
            Status::Complete => Some(3),
            Status::Error => None,
        }
    }

    /// Whether the pipeline may move from `self` to `next`.
    ///
    /// `Error` is reachable from any non-error state and leaves nowhere.
    /// Otherwise the status must move strictly forward.
    pub fn can_advance_to(&self, next: Status) -> bool {
        match (self.rank(), next.rank()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(from), Some(to)) => to > from,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Complete | Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The structure threaded through every stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub search_queries: Vec<String>,
    pub documents: Vec<Document>,
    pub session_id: String,
    pub report: String,
    pub sources: Vec<String>,
    pub status: Status,
    pub logs: Vec<String>,
    pub error: String,
}

/// The closed set of fields a stage may write. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialState {
    pub subtopics: Option<Vec<String>>,
    pub search_queries: Option<Vec<String>>,
    /// Appended to the accumulated documents.
    pub documents: Vec<Document>,
    pub session_id: Option<String>,
    pub report: Option<String>,
    pub sources: Option<Vec<String>>,
    pub error: Option<String>,
}

/// The result of running one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageUpdate {
    pub fields: PartialState,
    pub status: Status,
    /// Appended to the accumulated logs.
    pub logs: Vec<String>,
}

impl StageUpdate {
    pub fn new(fields: PartialState, status: Status, logs: Vec<String>) -> Self {
        Self {
            fields,
            status,
            logs,
        }
    }

    /// The error-shaped update: `status = error`, the message, one log line.
    pub fn failed(error: String, log_line: String) -> Self {
        Self {
            fields: PartialState {
                error: Some(error),
                ..PartialState::default()
            },
            status: Status::Error,
            logs: vec![log_line],
        }
    }
}

impl WorkflowState {
    /// Fresh state for `topic` with every other field empty.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            subtopics: Vec::new(),
            search_queries: Vec::new(),
            documents: Vec::new(),
            session_id: String::new(),
            report: String::new(),
            sources: Vec::new(),
            status: Status::Initialized,
            logs: Vec::new(),
            error: String::new(),
        }
    }

    /// Fold a stage update into the state.
    ///
    /// Rejects updates whose status would move the pipeline backwards or out
    /// of `Error`; the state is left untouched in that case.
    pub fn merge(&mut self, update: StageUpdate) -> Result<(), ResearchError> {
        if !self.status.can_advance_to(update.status) {
            return Err(ResearchError::InvalidTransition {
                from: self.status,
                to: update.status,
            });
        }

        let StageUpdate {
            fields,
            status,
            logs,
        } = update;

        if let Some(v) = fields.subtopics {
            self.subtopics = v;
        }
        if let Some(v) = fields.search_queries {
            self.search_queries = v;
        }
        self.documents.extend(fields.documents);
        if let Some(v) = fields.session_id {
            self.session_id = v;
        }
        if let Some(v) = fields.report {
            self.report = v;
        }
        if let Some(v) = fields.sources {
            self.sources = v;
        }
        if let Some(v) = fields.error {
            self.error = v;
        }
        self.status = status;
        self.logs.extend(logs);
        Ok(())
    }

    /// Convert the state into what a presentation layer may rely on.
    pub fn outcome(&self) -> ResearchOutcome {
        match self.status {
            Status::Complete => ResearchOutcome::Complete {
                topic: self.topic.clone(),
                report: self.report.clone(),
                sources: self.sources.clone(),
                session_id: self.session_id.clone(),
                subtopics: self.subtopics.clone(),
                documents_count: self.documents.len(),
                logs: self.logs.clone(),
            },
            status => ResearchOutcome::Failed {
                status,
                error: if self.error.is_empty() {
                    format!("workflow stopped at status '{}'", status)
                } else {
                    self.error.clone()
                },
                logs: self.logs.clone(),
            },
        }
    }
}

/// Terminal result of a research run.
///
/// `report` and `sources` exist only on `Complete`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResearchOutcome {
    Complete {
        topic: String,
        report: String,
        sources: Vec<String>,
        session_id: String,
        subtopics: Vec<String>,
        documents_count: usize,
        logs: Vec<String>,
    },
    Failed {
        status: Status,
        error: String,
        logs: Vec<String>,
    },
}

impl ResearchOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, ResearchOutcome::Complete { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str) -> Document {
        Document {
            url: url.to_string(),
            title: String::new(),
            content: "c".to_string(),
            source: "web".to_string(),
            query: "q".to_string(),
        }
    }

    fn update(status: Status, docs: Vec<Document>, logs: &[&str]) -> StageUpdate {
        StageUpdate::new(
            PartialState {
                documents: docs,
                ..PartialState::default()
            },
            status,
            logs.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_status_transitions() {
        assert!(Status::Initialized.can_advance_to(Status::PlanningComplete));
        assert!(Status::PlanningComplete.can_advance_to(Status::ResearchComplete));
        assert!(Status::ResearchComplete.can_advance_to(Status::Complete));
        assert!(Status::Initialized.can_advance_to(Status::Error));
        assert!(Status::ResearchComplete.can_advance_to(Status::Error));
        assert!(!Status::Complete.can_advance_to(Status::PlanningComplete));
        assert!(!Status::ResearchComplete.can_advance_to(Status::ResearchComplete));
        assert!(!Status::Error.can_advance_to(Status::Complete));
        assert!(!Status::Error.can_advance_to(Status::Error));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Status::PlanningComplete).unwrap(),
            "\"planning_complete\""
        );
        assert_eq!(Status::ResearchComplete.to_string(), "research_complete");
    }

    #[test]
    fn test_accumulate_fields_never_shrink() {
        let mut state = WorkflowState::new("topic");
        let updates = vec![
            update(Status::PlanningComplete, vec![], &["a", "b"]),
            update(Status::ResearchComplete, vec![doc("1"), doc("2")], &["c"]),
            update(Status::Complete, vec![doc("1")], &["d", "e", "f"]),
        ];
        let mut docs_so_far = 0;
        let mut logs_so_far = 0;
        for u in updates {
            docs_so_far += u.fields.documents.len();
            logs_so_far += u.logs.len();
            let before_docs = state.documents.len();
            let before_logs = state.logs.len();
            state.merge(u).unwrap();
            assert!(state.documents.len() >= before_docs);
            assert!(state.logs.len() >= before_logs);
            assert_eq!(state.documents.len(), docs_so_far);
            assert_eq!(state.logs.len(), logs_so_far);
        }
        let urls: Vec<&str> = state.documents.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, vec!["1", "2", "1"]);
        assert_eq!(state.logs, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_overwrite_fields_last_writer_wins() {
        let mut state = WorkflowState::new("topic");
        state
            .merge(StageUpdate::new(
                PartialState {
                    subtopics: Some(vec!["x".into()]),
                    session_id: Some("first".into()),
                    ..PartialState::default()
                },
                Status::PlanningComplete,
                vec![],
            ))
            .unwrap();
        state
            .merge(StageUpdate::new(
                PartialState {
                    session_id: Some("second".into()),
                    ..PartialState::default()
                },
                Status::ResearchComplete,
                vec![],
            ))
            .unwrap();
        assert_eq!(state.session_id, "second");
        assert_eq!(state.subtopics, vec!["x"]);
        assert_eq!(state.topic, "topic");
    }

    #[test]
    fn test_backward_transition_rejected_and_state_untouched() {
        let mut state = WorkflowState::new("topic");
        state.merge(update(Status::PlanningComplete, vec![], &["a"])).unwrap();
        let before = state.clone();
        let err = state
            .merge(update(Status::Initialized, vec![doc("1")], &["b"]))
            .unwrap_err();
        assert!(matches!(err, ResearchError::InvalidTransition { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn test_failed_update_shape() {
        let mut state = WorkflowState::new("topic");
        state
            .merge(StageUpdate::failed("boom".into(), "✗ Plan: boom".into()))
            .unwrap();
        assert_eq!(state.status, Status::Error);
        assert_eq!(state.error, "boom");
        assert_eq!(state.logs.len(), 1);
    }

    #[test]
    fn test_outcome_shapes() {
        let mut state = WorkflowState::new("topic");
        state
            .merge(StageUpdate::failed("nope".into(), "✗".into()))
            .unwrap();
        let json = serde_json::to_value(state.outcome()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "nope");
        assert!(json.get("report").is_none());

        let mut done = WorkflowState::new("topic");
        done.merge(StageUpdate::new(
            PartialState {
                report: Some("r".into()),
                sources: Some(vec!["u".into()]),
                session_id: Some("s".into()),
                documents: vec![doc("u")],
                ..PartialState::default()
            },
            Status::Complete,
            vec![],
        ))
        .unwrap();
        let outcome = done.outcome();
        assert!(outcome.is_complete());
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json["documents_count"], 1);
        assert_eq!(json["session_id"], "s");
    }
}
