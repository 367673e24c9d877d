//! Linear Plan → Collect → Synthesize runner.
//!
//! Stages run strictly one after another; each update is merged into the
//! state before the next stage starts. When a stage reports `error` the
//! remaining stages are skipped and the state is returned as is.

use anyhow::{bail, Result};
use tracing::info;

use crate::stages::{CollectStage, PlanStage, Stage, SynthesizeStage};
use crate::state::{Status, WorkflowState};

/// A progress event emitted while the workflow runs.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowEvent {
    /// A stage is about to run.
    StageStarted { stage: &'static str },
    /// A stage's update has been merged into the state.
    StageFinished {
        stage: &'static str,
        status: Status,
        logs: Vec<String>,
    },
}

/// Receives workflow progress. Implementations must not block.
pub trait WorkflowObserver: Send + Sync {
    fn report(&self, event: WorkflowEvent);
}

/// Discards every event.
pub struct NoObserver;

impl WorkflowObserver for NoObserver {
    fn report(&self, _event: WorkflowEvent) {}
}

/// The fixed three-stage research pipeline.
pub struct ResearchWorkflow {
    stages: Vec<Box<dyn Stage>>,
}

impl ResearchWorkflow {
    pub fn new(plan: PlanStage, collect: CollectStage, synthesize: SynthesizeStage) -> Self {
        Self {
            stages: vec![Box::new(plan), Box::new(collect), Box::new(synthesize)],
        }
    }

    /// Run the pipeline for `topic` from a fresh state.
    pub async fn run(&self, topic: &str, observer: &dyn WorkflowObserver) -> Result<WorkflowState> {
        let topic = topic.trim();
        if topic.is_empty() {
            bail!("research topic must not be empty");
        }
        self.run_state(WorkflowState::new(topic), observer).await
    }

    /// Run the pipeline starting from `state`.
    ///
    /// Errors only when a stage produces an update the state rejects;
    /// stage failures are reported through `status` and `error`.
    pub async fn run_state(
        &self,
        mut state: WorkflowState,
        observer: &dyn WorkflowObserver,
    ) -> Result<WorkflowState> {
        for stage in &self.stages {
            if state.status.is_terminal() {
                break;
            }
            let name = stage.name();
            observer.report(WorkflowEvent::StageStarted { stage: name });

            let update = stage.run(&state).await;
            let logs = update.logs.clone();
            state.merge(update)?;

            info!(stage = name, status = %state.status, "stage finished");
            observer.report(WorkflowEvent::StageFinished {
                stage: name,
                status: state.status,
                logs,
            });
        }
        Ok(state)
    }
}
