//! `research sessions` and `research delete`.

use anyhow::Result;

use research_harness_core::store::RetrievalIndex;

use crate::config::Config;
use crate::pipeline;

pub async fn run_sessions(config: &Config) -> Result<()> {
    let index = pipeline::open_index(config).await?;
    let sessions = index.list_sessions().await?;

    if sessions.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!("{:<38} {:<22} {:>8}", "SESSION", "CREATED", "CHUNKS");
    for s in &sessions {
        println!(
            "{:<38} {:<22} {:>8}",
            s.id,
            format_ts_iso(s.created_at),
            s.chunk_count
        );
    }
    Ok(())
}

/// Delete a session's collection. Deleting an unknown session is reported
/// but is not an error.
pub async fn run_delete(config: &Config, session_id: &str) -> Result<()> {
    let index = pipeline::open_index(config).await?;
    let existed = index.session_exists(session_id).await?;
    index.delete_collection(session_id).await?;
    if existed {
        println!("Deleted session {}", session_id);
    } else {
        println!("Session {} not found; nothing to delete.", session_id);
    }
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
