//! Workflow progress reporting.
//!
//! Reports each stage of `research run` as it starts and finishes so users
//! see where a long run is. Progress goes to **stderr** so stdout stays
//! parseable for scripts.

use std::io::Write;

use research_harness_core::workflow::{NoObserver, WorkflowEvent, WorkflowObserver};

/// Human-friendly progress on stderr:
///
/// ```text
/// [plan] running...
///   ✓ Planner: Identified 4 key subtopics
/// [plan] planning_complete
/// ```
pub struct StderrProgress;

impl WorkflowObserver for StderrProgress {
    fn report(&self, event: WorkflowEvent) {
        let text = match &event {
            WorkflowEvent::StageStarted { stage } => format!("[{}] running...\n", stage),
            WorkflowEvent::StageFinished {
                stage,
                status,
                logs,
            } => {
                let mut out = String::new();
                for line in logs {
                    out.push_str(&format!("  {}\n", line));
                }
                out.push_str(&format!("[{}] {}\n", stage, status));
                out
            }
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl JsonProgress {
    fn to_json(event: &WorkflowEvent) -> serde_json::Value {
        match event {
            WorkflowEvent::StageStarted { stage } => serde_json::json!({
                "event": "stage_started",
                "stage": stage,
            }),
            WorkflowEvent::StageFinished {
                stage,
                status,
                logs,
            } => serde_json::json!({
                "event": "stage_finished",
                "stage": stage,
                "status": status,
                "logs": logs,
            }),
        }
    }
}

impl WorkflowObserver for JsonProgress {
    fn report(&self, event: WorkflowEvent) {
        if let Ok(line) = serde_json::to_string(&Self::to_json(&event)) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => anyhow::bail!("Unknown progress mode '{}'. Use off, human, or json.", other),
        }
    }

    pub fn observer(&self) -> Box<dyn WorkflowObserver> {
        match self {
            ProgressMode::Off => Box::new(NoObserver),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
