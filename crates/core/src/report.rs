use crate::error::SessionError;
use crate::model::{AnalysisLogEntry, FeedbackReport, Message, ResumeProfile};
use serde::Serialize;

/// Body of the report request, in the shape the scoring endpoint reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRequest {
    pub resume_text: String,
    pub chat_history: Vec<Message>,
    pub analysis_log: Vec<String>,
}

/// Packages a finished interview for scoring and keeps the resulting report.
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    report: Option<FeedbackReport>,
}

impl ReportAssembler {
    pub fn assemble(
        resume: &ResumeProfile,
        transcript: &[Message],
        analysis_log: &[AnalysisLogEntry],
    ) -> Result<FeedbackRequest, SessionError> {
        let resume_text = resume.text().ok_or(SessionError::ResumeMissing)?;
        Ok(FeedbackRequest {
            resume_text: resume_text.to_string(),
            chat_history: transcript.to_vec(),
            analysis_log: analysis_log.iter().map(AnalysisLogEntry::to_wire).collect(),
        })
    }

    /// Stores the report. A report is kept for good once accepted; later
    /// reports are ignored and `false` is returned.
    pub fn accept(&mut self, report: FeedbackReport) -> bool {
        if self.report.is_some() {
            tracing::warn!("Ignoring a second report for the same session");
            return false;
        }
        self.report = Some(report);
        true
    }

    pub fn report(&self) -> Option<&FeedbackReport> {
        self.report.as_ref()
    }
}
