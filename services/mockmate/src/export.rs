use anyhow::{Context, Result};
use mockmate_core::{AnalysisLogEntry, FeedbackReport, Message, SessionState};
use serde::Serialize;
use std::path::Path;

/// What `--save` writes: the conversation, the evaluator notes and the report.
#[derive(Debug, Serialize)]
struct SessionExport<'a> {
    phase: String,
    transcript: &'a [Message],
    analysis_log: Vec<String>,
    failed_turns: &'a [usize],
    report: Option<&'a FeedbackReport>,
}

pub async fn save_session(state: &SessionState, path: &Path) -> Result<()> {
    let export = SessionExport {
        phase: state.phase.to_string(),
        transcript: &state.transcript,
        analysis_log: state.analysis_log.iter().map(AnalysisLogEntry::to_wire).collect(),
        failed_turns: &state.failed_turns,
        report: state.report(),
    };
    let json = serde_json::to_string_pretty(&export).context("Failed to serialize session")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Session saved to {}", path.display());
    Ok(())
}
