use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Content shown for a voice turn until the service returns its transcription.
pub const PROCESSING_VOICE: &str = "🎤 [Processing Voice...]";

/// The phase a session is in. Phases only move forward; `reset` is the only way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Upload,
    Interview,
    Feedback,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionPhase::Upload => "upload",
            SessionPhase::Interview => "interview",
            SessionPhase::Feedback => "feedback",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the transcript, in the shape the service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// The interviewer's hidden note for one completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisLogEntry {
    pub turn_index: usize,
    pub note: String,
}

impl AnalysisLogEntry {
    /// Renders the entry the way the report endpoint reads it.
    pub fn to_wire(&self) -> String {
        if self.turn_index == 0 {
            format!("Turn 0 (Intro): {}", self.note)
        } else {
            format!("Turn {}: {}", self.turn_index, self.note)
        }
    }
}

/// Text extracted from the candidate's resume.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResumeProfile {
    pub raw_text: Option<String>,
}

impl ResumeProfile {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: Some(raw_text.into()),
        }
    }

    /// The resume text, if any non-whitespace text was extracted.
    pub fn text(&self) -> Option<&str> {
        self.raw_text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// The scored report produced when the interview ends.
///
/// Every field falls back to its default because archived sessions whose report
/// generation failed are stored with an empty object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeedbackReport {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub verdict: String,
    #[serde(default, rename = "feedback_summary")]
    pub summary: String,
    #[serde(default)]
    pub category_scores: BTreeMap<String, f64>,
    #[serde(default, rename = "strong_areas")]
    pub strengths: Vec<String>,
    #[serde(default, rename = "weak_areas")]
    pub weaknesses: Vec<String>,
}

impl FeedbackReport {
    /// Clamps the overall score to 0..=100 and category scores to 0..=10.
    pub fn clamped(mut self) -> Self {
        self.score = self.score.clamp(0, 100);
        for (name, value) in self.category_scores.iter_mut() {
            if !(0.0..=10.0).contains(value) {
                tracing::debug!("Clamping out-of-range category score {name}={value}");
                *value = value.clamp(0.0, 10.0);
            }
        }
        self
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand::from_score(self.score)
    }
}

/// Coarse grouping of an overall score out of 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

impl ScoreBand {
    pub fn from_score(score: i64) -> Self {
        if score >= 70 {
            ScoreBand::Strong
        } else if score >= 50 {
            ScoreBand::Moderate
        } else {
            ScoreBand::Weak
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScoreBand::Strong => "strong",
            ScoreBand::Moderate => "moderate",
            ScoreBand::Weak => "weak",
        };
        f.write_str(label)
    }
}

/// A finished interview as stored by the archive service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub verdict: String,
    #[serde(default)]
    pub feedback: FeedbackReport,
    #[serde(default)]
    pub chat_history: Vec<Message>,
}

/// A finished recording ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioBlob {
    pub fn wav(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "audio/wav".to_string(),
            file_name: "recording.wav".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encoded speech for one assistant turn (MP3 or WAV).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedClip(pub Vec<u8>);

impl SynthesizedClip {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_lowercase_roles() {
        let json = serde_json::to_string(&Message::assistant("Tell me about yourself.")).unwrap();
        assert_eq!(
            json,
            r#"{"role":"assistant","content":"Tell me about yourself."}"#
        );
    }

    #[test]
    fn test_analysis_entry_wire_format() {
        let intro = AnalysisLogEntry {
            turn_index: 0,
            note: "Starting interview.".to_string(),
        };
        let later = AnalysisLogEntry {
            turn_index: 3,
            note: "Candidate is vague.".to_string(),
        };
        assert_eq!(intro.to_wire(), "Turn 0 (Intro): Starting interview.");
        assert_eq!(later.to_wire(), "Turn 3: Candidate is vague.");
    }

    #[test]
    fn test_resume_profile_ignores_blank_text() {
        assert_eq!(ResumeProfile::default().text(), None);
        assert_eq!(ResumeProfile::new("  \n").text(), None);
        assert_eq!(ResumeProfile::new("Rust dev").text(), Some("Rust dev"));
    }

    #[test]
    fn test_feedback_report_reads_service_field_names() {
        let json = r#"{
            "score": 78,
            "verdict": "Hire",
            "feedback_summary": "Solid systems depth.",
            "weak_areas": ["Estimation"],
            "strong_areas": ["Caching", "Ownership"],
            "category_scores": {"Technical Skills": 8, "Communication": 7.5}
        }"#;
        let report: FeedbackReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.score, 78);
        assert_eq!(report.summary, "Solid systems depth.");
        assert_eq!(report.strengths, vec!["Caching", "Ownership"]);
        assert_eq!(report.weaknesses, vec!["Estimation"]);
        assert_eq!(report.category_scores["Communication"], 7.5);
        assert_eq!(report.band(), ScoreBand::Strong);
    }

    #[test]
    fn test_feedback_report_clamps_ranges() {
        let mut report = FeedbackReport {
            score: 140,
            ..Default::default()
        };
        report.category_scores.insert("Communication".into(), 12.0);
        report.category_scores.insert("Problem Solving".into(), -1.0);
        let report = report.clamped();
        assert_eq!(report.score, 100);
        assert_eq!(report.category_scores["Communication"], 10.0);
        assert_eq!(report.category_scores["Problem Solving"], 0.0);
    }

    #[test]
    fn test_history_record_tolerates_empty_feedback() {
        let json = r#"{"id": 4, "date": "2025-01-02 10:00:00", "score": 0, "verdict": "N/A",
                       "feedback": {}, "chat_history": [{"role": "user", "content": "hi"}]}"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.feedback, FeedbackReport::default());
        assert_eq!(record.chat_history, vec![Message::user("hi")]);
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::from_score(70), ScoreBand::Strong);
        assert_eq!(ScoreBand::from_score(69), ScoreBand::Moderate);
        assert_eq!(ScoreBand::from_score(50), ScoreBand::Moderate);
        assert_eq!(ScoreBand::from_score(49), ScoreBand::Weak);
    }
}
